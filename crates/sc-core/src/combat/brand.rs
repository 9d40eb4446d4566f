//! Brands, attack flavours and the on-hit effects they leave behind

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::actor::Mid;

/// Melee weapon brand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum Brand {
    #[default]
    Normal,
    Flaming,
    Freezing,
    /// Extra damage against undead and demons
    HolyWrath,
    Electrocution,
    Venom,
    Draining,
    Vampirism,
    Pain,
    Antimagic,
    /// Picks one of the other brands on every hit
    Chaos,
    FoulFlame,
}

impl Brand {
    /// Brands a chaos weapon can turn into.
    pub const CHAOS_CHOICES: [Brand; 8] = [
        Brand::Flaming,
        Brand::Freezing,
        Brand::Electrocution,
        Brand::Venom,
        Brand::Draining,
        Brand::Vampirism,
        Brand::Pain,
        Brand::Antimagic,
    ];

    /// Brands a pandemonium lord can be generated with.
    pub const DEMONIC: [Brand; 9] = [
        Brand::Flaming,
        Brand::Freezing,
        Brand::Electrocution,
        Brand::Venom,
        Brand::Draining,
        Brand::Vampirism,
        Brand::Pain,
        Brand::Antimagic,
        Brand::Chaos,
    ];

    /// Whether a generated monster profile may carry this brand.
    pub fn legal_for_ghost(self) -> bool {
        !matches!(self, Brand::HolyWrath)
    }
}

/// Ammunition brand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum MissileBrand {
    #[default]
    Normal,
    Flame,
    Frost,
    Poisoned,
    /// Strong poison that also slows
    Curare,
    /// Extra damage against undead and demons
    Silver,
    /// Drives living targets berserk
    Frenzy,
    Chaos,
}

impl MissileBrand {
    pub const CHAOS_CHOICES: [MissileBrand; 5] = [
        MissileBrand::Flame,
        MissileBrand::Frost,
        MissileBrand::Poisoned,
        MissileBrand::Curare,
        MissileBrand::Silver,
    ];
}

/// Extra effect carried by a natural monster attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum AttackFlavour {
    #[default]
    Plain,
    Fire,
    Cold,
    Elec,
    Poison,
    Paralyse,
    Confuse,
    Slow,
    Drain,
    Corrode,
    Weakness,
    Vampiric,
    /// Starts a body hold
    Constrict,
    /// Starts a reach hold
    Entangle,
    Holy,
    Pain,
}

/// How a natural attack is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum MonAttackKind {
    #[default]
    Hit,
    Bite,
    Sting,
    Claw,
    Constrict,
    Touch,
    Punch,
}

impl MonAttackKind {
    pub fn verb(self) -> &'static str {
        match self {
            MonAttackKind::Hit => "hit",
            MonAttackKind::Bite => "bite",
            MonAttackKind::Sting => "sting",
            MonAttackKind::Claw => "claw",
            MonAttackKind::Constrict => "constrict",
            MonAttackKind::Touch => "touch",
            MonAttackKind::Punch => "punch",
        }
    }
}

/// Something that happened to an actor because an attack connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitEffect {
    Poisoned,
    Paralysed,
    Confused,
    Slowed,
    Drained,
    Corroded,
    Weakened,
    /// Magic disrupted
    Antimagic,
    /// Driven berserk
    Frenzied,
    /// Caught in a hold
    Constricted,
    /// The attacker healed this much
    AttackerHealed(i32),
    /// A chaos brand resolved to this brand
    ChaosBrand(Brand),
    ChaosMissile(MissileBrand),
    /// Extra elemental or holy damage
    BrandDamage(i32),
    /// The target was hit while unable to defend itself
    Stabbed { target: Mid },
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_holy_wrath_is_never_legal_for_ghosts() {
        let illegal: Vec<Brand> = Brand::iter().filter(|b| !b.legal_for_ghost()).collect();
        assert_eq!(illegal, vec![Brand::HolyWrath]);
        assert!(Brand::DEMONIC.iter().all(|b| b.legal_for_ghost()));
    }

    #[test]
    fn test_chaos_never_picks_itself() {
        assert!(!Brand::CHAOS_CHOICES.contains(&Brand::Chaos));
        assert!(!MissileBrand::CHAOS_CHOICES.contains(&MissileBrand::Chaos));
    }
}
