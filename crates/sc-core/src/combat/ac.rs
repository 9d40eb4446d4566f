//! Armour absorption
//!
//! Armour soaks a random share of each hit, up to the full armour class, so
//! heavy armour makes small hits vanish while big hits still land. Guaranteed
//! damage reduction puts a floor under the soak for heavily armoured
//! targets. The result is never negative.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::random_var::RandomVar;
use crate::rng::GameRng;

/// How much of the defender's armour counts against a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum AcRule {
    /// Armour is ignored
    None,
    #[default]
    Normal,
    /// Half armour, used by holds and other crushing damage
    Half,
    /// Triple armour and extra guaranteed reduction
    Triple,
}

/// Extra guaranteed reduction under [`AcRule::Triple`].
const TRIPLE_GDR_BONUS: i32 = 20;

fn effective(ac: i32, gdr: i32, rule: AcRule) -> Option<(i32, i32)> {
    let ac = ac.max(0);
    let gdr = gdr.clamp(0, 100);
    match rule {
        AcRule::None => None,
        AcRule::Normal => Some((ac, gdr)),
        AcRule::Half => Some((ac / 2, gdr)),
        AcRule::Triple => Some((ac * 3, (gdr + TRIPLE_GDR_BONUS).min(100))),
    }
}

fn soak(damage: i32, ac: i32, gdr: i32, roll: i32) -> i32 {
    let floor = (gdr * damage / 100).min(ac / 2);
    (damage - roll.max(floor)).max(0)
}

/// Reduce `damage` by armour, drawing one roll for the soak.
pub fn apply_ac(rng: &mut GameRng, damage: i32, ac: i32, gdr_percent: i32, rule: AcRule) -> i32 {
    let damage = damage.max(0);
    let Some((ac, gdr)) = effective(ac, gdr_percent, rule) else {
        return damage;
    };
    let roll = rng.random2(ac + 1);
    soak(damage, ac, gdr, roll)
}

/// Distribution of damage after armour, for a distribution of raw damage.
pub fn ac_damage_var(damage: &RandomVar, ac: i32, gdr_percent: i32, rule: AcRule) -> RandomVar {
    let Some((ac, gdr)) = effective(ac, gdr_percent, rule) else {
        return damage.map(|d| d.max(0));
    };
    let rolls = RandomVar::uniform(0, ac);
    damage.flat_map(|d| {
        let d = d.max(0);
        rolls.map(|roll| soak(d, ac, gdr, roll))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ac_passes_damage_through() {
        let mut rng = GameRng::always_max();
        assert_eq!(apply_ac(&mut rng, 9, 0, 0, AcRule::Normal), 9);
        assert_eq!(apply_ac(&mut rng, 0, 0, 0, AcRule::Normal), 0);
    }

    #[test]
    fn test_never_negative() {
        let mut rng = GameRng::always_max();
        assert_eq!(apply_ac(&mut rng, 3, 40, 0, AcRule::Normal), 0);
        assert_eq!(apply_ac(&mut rng, -5, 0, 0, AcRule::None), 0);
    }

    #[test]
    fn test_half_rule_uses_half_armour() {
        let mut rng = GameRng::always_max();
        assert_eq!(apply_ac(&mut rng, 20, 10, 0, AcRule::Half), 15);
        assert_eq!(apply_ac(&mut rng, 20, 10, 0, AcRule::None), 20);
    }

    #[test]
    fn test_gdr_floor() {
        // lowest soak roll, but half of 10 AC is still guaranteed at 50% gdr
        let mut rng = GameRng::always_min();
        assert_eq!(apply_ac(&mut rng, 20, 10, 50, AcRule::Normal), 15);
        assert_eq!(apply_ac(&mut rng, 20, 10, 0, AcRule::Normal), 20);
    }

    #[test]
    fn test_expected_damage_falls_with_ac() {
        let raw = RandomVar::uniform(0, 12);
        let mut last = f64::INFINITY;
        for ac in 0..30 {
            let e = ac_damage_var(&raw, ac, 10, AcRule::Normal).expected();
            assert!(e <= last + 1e-9);
            assert!(e >= 0.0);
            last = e;
        }
    }
}
