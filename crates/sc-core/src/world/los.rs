//! Line of sight
//!
//! Sight is a circle of the given radius, blocked by opaque cells along a
//! Bresenham line. The "no translucent walls" variant also stops at cells
//! that can be seen through but not reached through, such as glass.

use super::{Coord, World};

/// Chebyshev distance, the number of king moves between two cells.
pub fn grid_distance(a: Coord, b: Coord) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Squared Euclidean distance.
pub fn distance2(a: Coord, b: Coord) -> i32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Cells strictly between `from` and `to` on a Bresenham line.
pub fn line_between(from: Coord, to: Coord) -> Vec<Coord> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut cells = Vec::new();
    while (x, y) != (to.x, to.y) {
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        if (x, y) != (to.x, to.y) {
            cells.push(Coord::new(x, y));
        }
    }
    cells
}

fn in_radius(a: Coord, b: Coord, radius: i32) -> bool {
    distance2(a, b) <= radius * radius + 1
}

/// Whether `to` is visible from `from` within `radius`.
pub fn cell_see_cell(world: &World, from: Coord, to: Coord, radius: i32) -> bool {
    in_radius(from, to, radius)
        && line_between(from, to)
            .into_iter()
            .all(|c| !world.terrain(c).is_opaque())
}

/// Like [`cell_see_cell`] but translucent cells also block.
pub fn cell_see_cell_no_trans(world: &World, from: Coord, to: Coord, radius: i32) -> bool {
    in_radius(from, to, radius)
        && line_between(from, to).into_iter().all(|c| {
            let t = world.terrain(c);
            !t.is_opaque() && !t.is_translucent()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Terrain;

    #[test]
    fn test_grid_distance() {
        assert_eq!(grid_distance(Coord::new(0, 0), Coord::new(3, -2)), 3);
        assert_eq!(grid_distance(Coord::new(1, 1), Coord::new(1, 1)), 0);
    }

    #[test]
    fn test_line_excludes_endpoints() {
        let line = line_between(Coord::new(0, 0), Coord::new(3, 0));
        assert_eq!(line, vec![Coord::new(1, 0), Coord::new(2, 0)]);
        assert!(line_between(Coord::new(0, 0), Coord::new(1, 1)).is_empty());
    }

    #[test]
    fn test_walls_block_sight() {
        let mut world = World::new();
        let a = Coord::new(0, 0);
        let b = Coord::new(4, 0);
        assert!(cell_see_cell(&world, a, b, 7));
        world.set_terrain(Coord::new(2, 0), Terrain::Wall);
        assert!(!cell_see_cell(&world, a, b, 7));
    }

    #[test]
    fn test_glass_blocks_only_no_trans() {
        let mut world = World::new();
        let a = Coord::new(0, 0);
        let b = Coord::new(4, 0);
        world.set_terrain(Coord::new(2, 0), Terrain::Glass);
        assert!(cell_see_cell(&world, a, b, 7));
        assert!(!cell_see_cell_no_trans(&world, a, b, 7));
    }

    #[test]
    fn test_radius_limit() {
        let world = World::new();
        assert!(!cell_see_cell(&world, Coord::new(0, 0), Coord::new(9, 0), 7));
        assert!(cell_see_cell(&world, Coord::new(0, 0), Coord::new(7, 1), 7));
    }
}
