//! The actor arena and the bits of terrain combat cares about
//!
//! Actors are stored by [`Mid`]. Ids are never recycled, so references held
//! elsewhere (constriction links, enchantment sources) go stale safely once
//! their target is removed: lookups just return `None`.

mod los;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::actor::{Creature, Mid, Monster, Player};
use crate::constrict::{self, ConstrictionState};

pub use los::{cell_see_cell, cell_see_cell_no_trans, distance2, grid_distance, line_between};

/// Map coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Coord) -> i32 {
        grid_distance(self, other)
    }

    pub fn adjacent(self, other: Coord) -> bool {
        self != other && self.distance(other) <= 1
    }
}

/// Terrain features that matter to sight and holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum Terrain {
    #[default]
    Floor,
    Wall,
    /// See-through but impassable
    Glass,
    Tree,
    DeepWater,
    Lava,
}

impl Terrain {
    pub fn is_opaque(self) -> bool {
        matches!(self, Terrain::Wall | Terrain::Tree)
    }

    pub fn is_translucent(self) -> bool {
        self == Terrain::Glass
    }

    /// Ground that roots and grasping hands can reach through.
    pub fn is_solid_floor(self) -> bool {
        matches!(self, Terrain::Floor)
    }
}

/// All actors of one session plus sparse terrain.
#[derive(Debug, Clone)]
pub struct World {
    actors: HashMap<Mid, Creature>,
    next_mid: u32,
    terrain: HashMap<Coord, Terrain>,
    sanctuary: HashSet<Coord>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            actors: HashMap::new(),
            next_mid: 1,
            terrain: HashMap::new(),
            sanctuary: HashSet::new(),
        }
    }

    /// Place a monster, assigning it a fresh id.
    pub fn add_monster(&mut self, mut monster: Monster) -> Mid {
        let mid = Mid(self.next_mid);
        self.next_mid += 1;
        monster.mid = mid;
        self.actors.insert(mid, Creature::from(monster));
        mid
    }

    /// Place the player, replacing any previous one.
    ///
    /// Holds on the outgoing player are severed, and the newcomer starts
    /// with none of its own.
    pub fn set_player(&mut self, mut player: Player) -> Mid {
        if self.contains(Mid::PLAYER) {
            constrict::detach_all(self, Mid::PLAYER);
        }
        player.constriction = ConstrictionState::default();
        self.actors.insert(Mid::PLAYER, Creature::from(player));
        Mid::PLAYER
    }

    pub fn contains(&self, mid: Mid) -> bool {
        self.actors.contains_key(&mid)
    }

    pub fn actor(&self, mid: Mid) -> Option<&Creature> {
        self.actors.get(&mid)
    }

    pub fn actor_mut(&mut self, mid: Mid) -> Option<&mut Creature> {
        self.actors.get_mut(&mid)
    }

    pub fn monster(&self, mid: Mid) -> Option<&Monster> {
        self.actors.get(&mid).and_then(Creature::as_monster)
    }

    pub fn monster_mut(&mut self, mid: Mid) -> Option<&mut Monster> {
        self.actors.get_mut(&mid).and_then(Creature::as_monster_mut)
    }

    pub fn player(&self) -> Option<&Player> {
        self.actors.get(&Mid::PLAYER).and_then(Creature::as_player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.actors.get_mut(&Mid::PLAYER).and_then(Creature::as_player_mut)
    }

    /// Every actor id, sorted so iteration is reproducible.
    pub fn mids(&self) -> Vec<Mid> {
        let mut mids: Vec<Mid> = self.actors.keys().copied().collect();
        mids.sort_unstable();
        mids
    }

    /// Monster ids only, sorted.
    pub fn monster_mids(&self) -> Vec<Mid> {
        self.mids().into_iter().filter(|m| !m.is_player()).collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Take an actor out of the world.
    ///
    /// Every constriction link touching it is severed first, on both ends.
    pub fn remove_actor(&mut self, mid: Mid) -> Option<Creature> {
        if !self.contains(mid) {
            return None;
        }
        constrict::detach_all(self, mid);
        self.actors.remove(&mid)
    }

    pub fn terrain(&self, at: Coord) -> Terrain {
        self.terrain.get(&at).copied().unwrap_or_default()
    }

    pub fn set_terrain(&mut self, at: Coord, terrain: Terrain) {
        if terrain == Terrain::Floor {
            self.terrain.remove(&at);
        } else {
            self.terrain.insert(at, terrain);
        }
    }

    pub fn add_sanctuary(&mut self, at: Coord) {
        self.sanctuary.insert(at);
    }

    pub fn clear_sanctuary(&mut self) {
        self.sanctuary.clear();
    }

    pub fn is_sanctuary(&self, at: Coord) -> bool {
        self.sanctuary.contains(&at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Actor, MonAttack, MonsterType};
    use crate::combat::{AttackFlavour, MonAttackKind};
    use crate::constrict::{ConstrictType, links_consistent, start_constricting};
    use crate::session::GameSession;

    #[test]
    fn test_ids_are_never_reused() {
        let mut world = World::new();
        let a = world.add_monster(Monster::new(MonsterType::Generic, "a"));
        world.remove_actor(a);
        let b = world.add_monster(Monster::new(MonsterType::Generic, "b"));
        assert_ne!(a, b);
        assert!(world.actor(a).is_none());
        assert_eq!(world.actor(b).map(|c| c.mid()), Some(b));
    }

    #[test]
    fn test_mids_sorted_with_player_last() {
        let mut world = World::new();
        world.set_player(Player::new("Hero"));
        let a = world.add_monster(Monster::new(MonsterType::Generic, "a"));
        let b = world.add_monster(Monster::new(MonsterType::Generic, "b"));
        assert_eq!(world.mids(), vec![a, b, Mid::PLAYER]);
        assert_eq!(world.monster_mids(), vec![a, b]);
    }

    #[test]
    fn test_terrain_defaults_to_floor() {
        let mut world = World::new();
        let c = Coord::new(3, 3);
        assert_eq!(world.terrain(c), Terrain::Floor);
        world.set_terrain(c, Terrain::DeepWater);
        assert!(!world.terrain(c).is_solid_floor());
        world.set_terrain(c, Terrain::Floor);
        assert_eq!(world.terrain(c), Terrain::Floor);
    }

    #[test]
    fn test_adjacency() {
        let c = Coord::new(0, 0);
        assert!(c.adjacent(Coord::new(1, 1)));
        assert!(!c.adjacent(c));
        assert!(!c.adjacent(Coord::new(2, 0)));
    }

    #[test]
    fn test_replacing_player_severs_holds() {
        let mut session = GameSession::new(1);
        session.world.set_player(Player::new("Hero"));
        let naga = session.world.add_monster(
            Monster::new(MonsterType::Naga, "naga")
                .with_attack(MonAttack::new(MonAttackKind::Constrict, AttackFlavour::Constrict, 4))
                .at(Coord::new(1, 0)),
        );
        start_constricting(&mut session, naga, Mid::PLAYER, ConstrictType::Melee, None).unwrap();

        session.world.set_player(Player::new("Heir"));
        let holder = session.world.actor(naga).unwrap();
        assert!(!holder.constriction().is_constricting());
        assert_eq!(session.world.player().unwrap().constriction.constricted_by, None);
        assert!(links_consistent(&session.world));
    }
}
