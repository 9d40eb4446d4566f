//! Per-attack-style formulas
//!
//! Every attack runs the same phase skeleton. What differs between swinging a
//! weapon, punching, biting and shooting is only where to-hit and base damage
//! come from and how raw damage is scaled. Those three hooks live behind
//! [`AttackStrategy`].

use std::fmt;

use crate::actor::{Creature, Missile, MonAttack, Skill, Weapon};
use crate::random_var::RandomVar;

use super::{AttackFlavour, Brand, MissileBrand};

/// Attacker-side numbers, captured when the attack is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackSnapshot {
    pub attacker_is_player: bool,
    /// Trained fighter monster
    pub fighter: bool,
    /// Experience level for the player, hit dice for monsters
    pub level: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub fighting: i32,
    pub skill_level: i32,
    pub necromancy: i32,
    pub slaying: i32,
    pub might: bool,
    pub weak: bool,
    pub weapon: Option<Weapon>,
    pub missile: Option<Missile>,
    pub mon_attack: Option<MonAttack>,
    pub brand: Brand,
    pub missile_brand: MissileBrand,
    pub flavour: AttackFlavour,
}

impl AttackSnapshot {
    /// Capture `attacker` wielding whatever it holds, optionally using one
    /// natural attack or firing `missile`.
    pub fn capture(attacker: &Creature, mon_attack: Option<MonAttack>, missile: Option<Missile>) -> Self {
        let (fighter, skill_level, fighting, necromancy, slaying, strength, dexterity, weapon) =
            match attacker {
                Creature::Player(p) => {
                    let skill = match (&missile, &p.weapon) {
                        (Some(m), _) => m.skill,
                        (None, Some(w)) => w.skill,
                        (None, None) => Skill::Unarmed,
                    };
                    (
                        false,
                        p.skill(skill),
                        p.skill(Skill::Fighting),
                        p.skill(Skill::Necromancy),
                        p.slaying,
                        p.strength,
                        p.dexterity,
                        p.weapon.clone(),
                    )
                }
                Creature::Monster(m) => (
                    m.flags.contains(crate::actor::MonsterFlags::FIGHTER),
                    0,
                    0,
                    0,
                    0,
                    0,
                    0,
                    m.weapon.clone(),
                ),
            };
        let (might, weak) = match attacker {
            Creature::Player(p) => (
                p.has_duration(crate::actor::PlayerDuration::Might),
                p.has_duration(crate::actor::PlayerDuration::Weak),
            ),
            Creature::Monster(m) => (
                m.has_ench(crate::enchant::EnchantKind::Might),
                m.has_ench(crate::enchant::EnchantKind::Weak),
            ),
        };
        let weapon = if missile.is_some() { None } else { weapon };
        Self {
            attacker_is_player: attacker.is_player(),
            fighter,
            level: attacker.experience_level(),
            strength,
            dexterity,
            fighting,
            skill_level,
            necromancy,
            slaying,
            might,
            weak,
            brand: weapon.as_ref().map_or(Brand::Normal, |w| w.brand),
            missile_brand: missile.as_ref().map_or(MissileBrand::Normal, |m| m.brand),
            flavour: mon_attack.map_or(AttackFlavour::Plain, |a| a.flavour),
            weapon,
            missile,
            mon_attack,
        }
    }
}

/// Hooks that set one attack style apart.
pub trait AttackStrategy: fmt::Debug {
    /// To-hit before situational modifiers and the random roll.
    fn to_hit_base(&self, snap: &AttackSnapshot) -> i32;

    /// Raw damage roll.
    fn weapon_damage(&self, snap: &AttackSnapshot) -> RandomVar;

    /// Strength, skill and slaying applied to one raw roll.
    fn scale_damage(&self, snap: &AttackSnapshot, raw: i32) -> i32;

    fn is_ranged(&self) -> bool {
        false
    }

    /// Whether helpless or distracted targets take extra damage.
    fn can_stab(&self, snap: &AttackSnapshot) -> bool {
        snap.attacker_is_player && !self.is_ranged()
    }

    /// Bare verb for messages, e.g. "hit" or "bite".
    fn verb(&self, snap: &AttackSnapshot) -> &'static str;
}

const PLAYER_BASE_TO_HIT: i32 = 15;
const MONSTER_BASE_TO_HIT: i32 = 18;
const UNARMED_TO_HIT_BONUS: i32 = 6;
const UNARMED_BASE_DAMAGE: i32 = 3;

fn stat_multiplier(strength: i32, raw: i32) -> i32 {
    raw * (40 + (strength - 10) * 2).max(10) / 40
}

fn might_and_weakness(snap: &AttackSnapshot, dmg: i32) -> i32 {
    let mut dmg = dmg;
    if snap.might {
        dmg = dmg * 3 / 2;
    }
    if snap.weak {
        dmg = dmg * 2 / 3;
    }
    dmg
}

fn player_to_hit(snap: &AttackSnapshot) -> i32 {
    PLAYER_BASE_TO_HIT + snap.dexterity / 2 + snap.fighting + snap.skill_level + snap.slaying
}

fn monster_to_hit(snap: &AttackSnapshot) -> i32 {
    let per_hd = if snap.fighter { 25 } else { 15 };
    MONSTER_BASE_TO_HIT + snap.level * per_hd / 10
}

/// Player swinging a weapon
#[derive(Debug, Clone, Copy, Default)]
pub struct ArmedMelee;

impl AttackStrategy for ArmedMelee {
    fn to_hit_base(&self, snap: &AttackSnapshot) -> i32 {
        let weapon = snap.weapon.as_ref().map_or(0, |w| w.accuracy + w.plus);
        player_to_hit(snap) + weapon
    }

    fn weapon_damage(&self, snap: &AttackSnapshot) -> RandomVar {
        let base = snap.weapon.as_ref().map_or(0, |w| w.damage);
        RandomVar::uniform(0, base.max(0))
    }

    fn scale_damage(&self, snap: &AttackSnapshot, raw: i32) -> i32 {
        let mut dmg = stat_multiplier(snap.strength, raw);
        dmg = dmg * (25 + snap.skill_level) / 25;
        dmg = dmg * (30 + snap.fighting) / 30;
        dmg = might_and_weakness(snap, dmg);
        let plus = snap.weapon.as_ref().map_or(0, |w| w.plus);
        (dmg + plus + snap.slaying).max(0)
    }

    fn verb(&self, _snap: &AttackSnapshot) -> &'static str {
        "hit"
    }
}

/// Player fighting with bare hands
#[derive(Debug, Clone, Copy, Default)]
pub struct UnarmedMelee;

impl AttackStrategy for UnarmedMelee {
    fn to_hit_base(&self, snap: &AttackSnapshot) -> i32 {
        player_to_hit(snap) + UNARMED_TO_HIT_BONUS
    }

    fn weapon_damage(&self, snap: &AttackSnapshot) -> RandomVar {
        RandomVar::uniform(0, UNARMED_BASE_DAMAGE + snap.skill_level / 2)
    }

    fn scale_damage(&self, snap: &AttackSnapshot, raw: i32) -> i32 {
        let mut dmg = stat_multiplier(snap.strength, raw);
        dmg = dmg * (30 + snap.fighting) / 30;
        dmg = might_and_weakness(snap, dmg);
        (dmg + snap.slaying).max(0)
    }

    fn verb(&self, _snap: &AttackSnapshot) -> &'static str {
        "punch"
    }
}

/// A monster using one of its natural attacks, plus any wielded weapon
#[derive(Debug, Clone, Copy, Default)]
pub struct MonsterMelee;

impl AttackStrategy for MonsterMelee {
    fn to_hit_base(&self, snap: &AttackSnapshot) -> i32 {
        let weapon = snap.weapon.as_ref().map_or(0, |w| w.accuracy + w.plus);
        monster_to_hit(snap) + weapon
    }

    fn weapon_damage(&self, snap: &AttackSnapshot) -> RandomVar {
        let natural = snap.mon_attack.map_or(0, |a| a.damage);
        let weapon = snap.weapon.as_ref().map_or(0, |w| w.damage);
        let max = natural + weapon;
        if max <= 0 {
            RandomVar::constant(0)
        } else {
            RandomVar::uniform(1, max)
        }
    }

    fn scale_damage(&self, snap: &AttackSnapshot, raw: i32) -> i32 {
        let plus = snap.weapon.as_ref().map_or(0, |w| w.plus);
        (might_and_weakness(snap, raw) + plus).max(0)
    }

    fn verb(&self, snap: &AttackSnapshot) -> &'static str {
        snap.mon_attack.map_or("hit", |a| a.kind.verb())
    }
}

/// A thrown or fired projectile
#[derive(Debug, Clone, Copy, Default)]
pub struct RangedMissile;

impl AttackStrategy for RangedMissile {
    fn to_hit_base(&self, snap: &AttackSnapshot) -> i32 {
        let missile = snap.missile.as_ref().map_or(0, |m| m.accuracy + m.plus);
        if snap.attacker_is_player {
            PLAYER_BASE_TO_HIT + snap.dexterity / 2 + snap.fighting / 2 + snap.skill_level + snap.slaying + missile
        } else {
            monster_to_hit(snap) + missile
        }
    }

    fn weapon_damage(&self, snap: &AttackSnapshot) -> RandomVar {
        let base = snap.missile.as_ref().map_or(0, |m| m.damage).max(0);
        if snap.attacker_is_player {
            RandomVar::uniform(0, base)
        } else if base == 0 {
            RandomVar::constant(0)
        } else {
            RandomVar::uniform(1, base)
        }
    }

    fn scale_damage(&self, snap: &AttackSnapshot, raw: i32) -> i32 {
        let plus = snap.missile.as_ref().map_or(0, |m| m.plus);
        if snap.attacker_is_player {
            let dmg = raw * (25 + snap.skill_level) / 25;
            (dmg + plus + snap.slaying).max(0)
        } else {
            (raw + plus).max(0)
        }
    }

    fn is_ranged(&self) -> bool {
        true
    }

    fn verb(&self, _snap: &AttackSnapshot) -> &'static str {
        "hit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Monster, MonsterFlags, MonsterType, Player};

    #[test]
    fn test_neutral_player_scaling_is_identity() {
        let p: Creature = Player::new("Hero")
            .with_weapon(Weapon::new("club", Skill::MacesFlails, 7))
            .into();
        let snap = AttackSnapshot::capture(&p, None, None);
        for raw in 0..=7 {
            assert_eq!(ArmedMelee.scale_damage(&snap, raw), raw);
        }
        assert_eq!(ArmedMelee.weapon_damage(&snap).max(), 7);
    }

    #[test]
    fn test_skill_and_strength_raise_damage() {
        let p: Creature = Player::new("Hero")
            .with_stats(20, 10, 10)
            .with_skill(Skill::LongBlades, 10)
            .with_weapon(Weapon::new("sword", Skill::LongBlades, 10))
            .into();
        let snap = AttackSnapshot::capture(&p, None, None);
        assert!(ArmedMelee.scale_damage(&snap, 10) > 10);
    }

    #[test]
    fn test_fighters_hit_more_often() {
        let plain: Creature = Monster::new(MonsterType::Generic, "orc").with_hd(10).into();
        let fighter: Creature = Monster::new(MonsterType::Generic, "orc warrior")
            .with_hd(10)
            .with_flags(MonsterFlags::FIGHTER)
            .into();
        let a = AttackSnapshot::capture(&plain, None, None);
        let b = AttackSnapshot::capture(&fighter, None, None);
        assert_eq!(MonsterMelee.to_hit_base(&a), 33);
        assert_eq!(MonsterMelee.to_hit_base(&b), 43);
    }

    #[test]
    fn test_monster_damage_is_at_least_one() {
        let m: Creature = Monster::new(MonsterType::Generic, "rat").into();
        let attack = m.as_monster().and_then(|m| m.attacks.first().copied());
        let snap = AttackSnapshot::capture(&m, attack, None);
        let var = MonsterMelee.weapon_damage(&snap);
        assert_eq!((var.min(), var.max()), (1, 3));
        assert_eq!(MonsterMelee.verb(&snap), "hit");
    }

    #[test]
    fn test_only_player_melee_stabs() {
        let p: Creature = Player::new("Hero").into();
        let m: Creature = Monster::new(MonsterType::Generic, "rat").into();
        let ps = AttackSnapshot::capture(&p, None, None);
        let ms = AttackSnapshot::capture(&m, None, None);
        assert!(UnarmedMelee.can_stab(&ps));
        assert!(!RangedMissile.can_stab(&ps));
        assert!(!MonsterMelee.can_stab(&ms));
    }
}
