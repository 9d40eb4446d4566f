//! Enchantments: timed status effects on monsters
//!
//! A monster carries at most one [`MonEnchant`] per [`EnchantKind`]. Applying
//! a kind that is already present merges into the existing instance rather
//! than stacking a second one.

mod tick;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::actor::{EffectSource, KillCategory, Mid};
use crate::consts::{
    INFINITE_DURATION, MAX_ENCH_DEGREE_ABJURATION, MAX_ENCH_DEGREE_ACCUMULATING,
    MAX_ENCH_DEGREE_DEFAULT,
};

pub use tick::{
    add_ench, apply_enchantments, calc_duration, decay_enchantment, del_ench, lose_ench_duration,
    lose_ench_levels, tick_player,
};

/// Enchantment kinds.
///
/// Declaration order is processing order: composite effects come before the
/// parts they grant, so expiry of the whole is seen before its parts tick.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum EnchantKind {
    /// Grants haste and might
    Berserk,
    Haste,
    Might,
    Slow,
    Fear,
    Confusion,
    Invis,
    Poison,
    StickyFlame,
    Charm,
    Paralysis,
    Sleep,
    Petrifying,
    Petrified,
    Corrosion,
    Constricted,
    /// Elemental resistance boost
    Resistance,
    /// Negative energy
    Drained,
    Weak,
    Antimagic,
    Regeneration,
    /// Summoning timer; the monster vanishes when it runs out
    Abjuration,
}

impl EnchantKind {
    /// Highest degree an instance can reach by merging.
    pub fn max_degree(self) -> i32 {
        match self {
            EnchantKind::Abjuration => MAX_ENCH_DEGREE_ABJURATION,
            EnchantKind::Drained => MAX_ENCH_DEGREE_ACCUMULATING,
            _ => MAX_ENCH_DEGREE_DEFAULT,
        }
    }

    /// Whether degree wears down along with duration.
    pub fn decays_degree(self) -> bool {
        matches!(self, EnchantKind::Poison | EnchantKind::Drained)
    }

    /// Typical length, in turns per degree, when none is given.
    pub fn base_turns(self) -> i32 {
        match self {
            EnchantKind::Berserk => 8,
            EnchantKind::Haste | EnchantKind::Might | EnchantKind::Slow => 10,
            EnchantKind::Fear => 8,
            EnchantKind::Confusion => 4,
            EnchantKind::Invis => 15,
            EnchantKind::Poison => 6,
            EnchantKind::StickyFlame => 3,
            EnchantKind::Charm => 12,
            EnchantKind::Paralysis => 3,
            EnchantKind::Sleep => 20,
            EnchantKind::Petrifying => 3,
            EnchantKind::Petrified => 5,
            EnchantKind::Corrosion => 10,
            EnchantKind::Constricted => 1,
            EnchantKind::Resistance => 10,
            EnchantKind::Drained => 15,
            EnchantKind::Weak => 8,
            EnchantKind::Antimagic => 6,
            EnchantKind::Regeneration => 10,
            EnchantKind::Abjuration => 10,
        }
    }

    /// Trailing clause for the message shown when a monster loses this
    /// effect, e.g. "is no longer moving slowly".
    pub fn removal_message(self) -> Option<&'static str> {
        match self {
            EnchantKind::Berserk => Some("is no longer berserk."),
            EnchantKind::Haste => Some("is no longer moving quickly."),
            EnchantKind::Might => Some("no longer looks unusually strong."),
            EnchantKind::Slow => Some("is no longer moving slowly."),
            EnchantKind::Fear => Some("seems to regain its courage."),
            EnchantKind::Confusion => Some("seems less confused."),
            EnchantKind::Invis => Some("appears from thin air!"),
            EnchantKind::Poison => Some("looks more healthy."),
            EnchantKind::StickyFlame => Some("stops burning."),
            EnchantKind::Charm => Some("is no longer charmed."),
            EnchantKind::Paralysis => Some("can move again."),
            EnchantKind::Petrifying | EnchantKind::Petrified => None,
            EnchantKind::Corrosion => Some("is no longer covered in acid."),
            EnchantKind::Resistance => Some("is no longer unusually resistant."),
            EnchantKind::Weak => Some("no longer looks weakened."),
            EnchantKind::Antimagic => Some("regains its magic."),
            EnchantKind::Sleep
            | EnchantKind::Constricted
            | EnchantKind::Drained
            | EnchantKind::Regeneration
            | EnchantKind::Abjuration => None,
        }
    }
}

/// Whether an aura-granted effect came from a friendly or a hostile aura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum AuraPolarity {
    Friendly,
    Hostile,
}

/// One timed effect on a monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonEnchant {
    pub kind: EnchantKind,
    pub degree: i32,
    pub duration: i32,
    pub max_duration: i32,
    /// Attribution category of whoever caused it
    pub who: KillCategory,
    pub source: Mid,
    /// Set when an aura granted this effect
    pub aura: Option<AuraPolarity>,
}

impl MonEnchant {
    pub fn new(kind: EnchantKind, degree: i32, source: EffectSource, duration: i32) -> Self {
        let duration = duration.clamp(0, INFINITE_DURATION);
        Self {
            kind,
            degree: degree.clamp(1, kind.max_degree()),
            duration,
            max_duration: duration,
            who: source.who,
            source: source.mid,
            aura: None,
        }
    }

    pub fn with_aura(mut self, polarity: AuraPolarity) -> Self {
        self.aura = Some(polarity);
        self
    }

    pub fn effect_source(&self) -> EffectSource {
        EffectSource {
            mid: self.source,
            who: self.who,
        }
    }

    /// Fold a reapplication of the same kind into this instance.
    ///
    /// Degree adds up to the kind's cap; duration becomes the longer of the
    /// two; attribution moves to the newcomer unless the existing source is
    /// more attributable to the player.
    pub fn merge(&mut self, other: &MonEnchant) {
        debug_assert_eq!(self.kind, other.kind);
        self.degree = (self.degree + other.degree).min(self.kind.max_degree());
        self.duration = self.duration.max(other.duration).min(INFINITE_DURATION);
        self.max_duration = self.max_duration.max(other.max_duration).max(self.duration);
        self.merge_killer(other.who, other.source);
        self.aura = other.aura;
    }

    fn merge_killer(&mut self, who: KillCategory, source: Mid) {
        if who >= self.who {
            self.who = who;
            self.source = source;
        }
    }
}

/// All enchantments on one monster, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnchantmentSet {
    map: BTreeMap<EnchantKind, MonEnchant>,
}

impl EnchantmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, kind: EnchantKind) -> bool {
        self.map.contains_key(&kind)
    }

    pub fn get(&self, kind: EnchantKind) -> Option<&MonEnchant> {
        self.map.get(&kind)
    }

    pub fn get_mut(&mut self, kind: EnchantKind) -> Option<&mut MonEnchant> {
        self.map.get_mut(&kind)
    }

    /// Insert, replacing any instance of the same kind.
    pub fn insert(&mut self, ench: MonEnchant) -> Option<MonEnchant> {
        self.map.insert(ench.kind, ench)
    }

    pub fn remove(&mut self, kind: EnchantKind) -> Option<MonEnchant> {
        self.map.remove(&kind)
    }

    /// Present kinds in processing order.
    pub fn kinds(&self) -> Vec<EnchantKind> {
        self.map.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonEnchant> {
        self.map.values()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(who: KillCategory, mid: u32) -> EffectSource {
        EffectSource { mid: Mid(mid), who }
    }

    #[test]
    fn test_merge_takes_longer_duration_and_caps_degree() {
        let mut a = MonEnchant::new(EnchantKind::Slow, 3, from(KillCategory::Other, 1), 40);
        let b = MonEnchant::new(EnchantKind::Slow, 3, from(KillCategory::Other, 2), 25);
        a.merge(&b);
        assert_eq!(a.duration, 40);
        assert_eq!(a.degree, MAX_ENCH_DEGREE_DEFAULT);
        assert_eq!(a.source, Mid(2));
    }

    #[test]
    fn test_merge_keeps_player_attribution() {
        let mut a = MonEnchant::new(EnchantKind::Poison, 1, from(KillCategory::You, 1), 10);
        let b = MonEnchant::new(EnchantKind::Poison, 1, from(KillCategory::Other, 2), 10);
        a.merge(&b);
        assert_eq!(a.who, KillCategory::You);
        assert_eq!(a.source, Mid(1));
    }

    #[test]
    fn test_abjuration_has_larger_cap() {
        let mut a = MonEnchant::new(EnchantKind::Abjuration, 4, EffectSource::NONE, 10);
        a.merge(&MonEnchant::new(EnchantKind::Abjuration, 4, EffectSource::NONE, 10));
        assert_eq!(a.degree, MAX_ENCH_DEGREE_ABJURATION);
    }

    #[test]
    fn test_duration_clamped_to_infinite() {
        let e = MonEnchant::new(EnchantKind::Invis, 1, EffectSource::NONE, i32::MAX);
        assert_eq!(e.duration, INFINITE_DURATION);
    }

    #[test]
    fn test_set_orders_kinds() {
        let mut set = EnchantmentSet::new();
        set.insert(MonEnchant::new(EnchantKind::Weak, 1, EffectSource::NONE, 10));
        set.insert(MonEnchant::new(EnchantKind::Berserk, 1, EffectSource::NONE, 10));
        set.insert(MonEnchant::new(EnchantKind::Haste, 1, EffectSource::NONE, 10));
        assert_eq!(
            set.kinds(),
            vec![EnchantKind::Berserk, EnchantKind::Haste, EnchantKind::Weak]
        );
    }
}
