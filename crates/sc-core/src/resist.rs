//! Elemental resistances
//!
//! Monster data describes resistances with [`ResistFlags`]; at run time they
//! live in a packed [`MonResists`] that stores a small signed level per
//! channel. Combining two sets adds levels channel by channel.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Lowest and highest level a channel can hold.
pub const MIN_RESIST_LEVEL: i32 = -3;
pub const MAX_RESIST_LEVEL: i32 = 3;

const BITS_PER_CHANNEL: u32 = 4;
const CHANNEL_MASK: u64 = 0xF;

/// One resistance channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[repr(u8)]
pub enum ResistChannel {
    Fire = 0,
    Cold = 1,
    Elec = 2,
    Poison = 3,
    /// Negative energy (draining, pain)
    Negative = 4,
    Acid = 5,
    Steam = 6,
    Miasma = 7,
    Petrification = 8,
    Constriction = 9,
}

impl ResistChannel {
    fn shift(self) -> u32 {
        self as u32 * BITS_PER_CHANNEL
    }

    /// Level granted by a plain `RES_*` flag.
    ///
    /// Channels without gradations grant immunity straight away.
    pub fn default_level(self) -> i32 {
        match self {
            ResistChannel::Acid
            | ResistChannel::Steam
            | ResistChannel::Miasma
            | ResistChannel::Petrification
            | ResistChannel::Constriction => MAX_RESIST_LEVEL,
            _ => 1,
        }
    }
}

bitflags! {
    /// Resistance and vulnerability flags used in monster definitions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResistFlags: u32 {
        const RES_FIRE = 0x0000_0001;
        const VUL_FIRE = 0x0000_0002;
        const RES_COLD = 0x0000_0004;
        const VUL_COLD = 0x0000_0008;
        const RES_ELEC = 0x0000_0010;
        const VUL_ELEC = 0x0000_0020;
        const RES_POISON = 0x0000_0040;
        const VUL_POISON = 0x0000_0080;
        const RES_NEG = 0x0000_0100;
        const RES_ACID = 0x0000_0200;
        const VUL_ACID = 0x0000_0400;
        const RES_STEAM = 0x0000_0800;
        const RES_MIASMA = 0x0000_1000;
        const RES_PETRIFY = 0x0000_2000;
        const RES_CONSTRICT = 0x0000_4000;
    }
}

impl Serialize for ResistFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResistFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(ResistFlags::from_bits_truncate(bits))
    }
}

/// `(channel, resist flag, vulnerability flag)`
const FLAG_TABLE: &[(ResistChannel, ResistFlags, ResistFlags)] = &[
    (ResistChannel::Fire, ResistFlags::RES_FIRE, ResistFlags::VUL_FIRE),
    (ResistChannel::Cold, ResistFlags::RES_COLD, ResistFlags::VUL_COLD),
    (ResistChannel::Elec, ResistFlags::RES_ELEC, ResistFlags::VUL_ELEC),
    (ResistChannel::Poison, ResistFlags::RES_POISON, ResistFlags::VUL_POISON),
    (ResistChannel::Negative, ResistFlags::RES_NEG, ResistFlags::empty()),
    (ResistChannel::Acid, ResistFlags::RES_ACID, ResistFlags::VUL_ACID),
    (ResistChannel::Steam, ResistFlags::RES_STEAM, ResistFlags::empty()),
    (ResistChannel::Miasma, ResistFlags::RES_MIASMA, ResistFlags::empty()),
    (ResistChannel::Petrification, ResistFlags::RES_PETRIFY, ResistFlags::empty()),
    (ResistChannel::Constriction, ResistFlags::RES_CONSTRICT, ResistFlags::empty()),
];

/// Packed per-channel resistance levels.
///
/// Each channel takes four bits holding a two's complement level clamped to
/// `MIN_RESIST_LEVEL..=MAX_RESIST_LEVEL`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MonResists(u64);

impl MonResists {
    pub const NONE: MonResists = MonResists(0);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn level(self, channel: ResistChannel) -> i32 {
        let raw = ((self.0 >> channel.shift()) & CHANNEL_MASK) as u8;
        // sign-extend the nibble
        ((raw << 4) as i8 >> 4) as i32
    }

    pub fn with_level(self, channel: ResistChannel, level: i32) -> Self {
        let level = level.clamp(MIN_RESIST_LEVEL, MAX_RESIST_LEVEL);
        let nibble = (level as i8 as u8 as u64) & CHANNEL_MASK;
        let cleared = self.0 & !(CHANNEL_MASK << channel.shift());
        MonResists(cleared | (nibble << channel.shift()))
    }

    /// A set with one channel at `level`.
    pub fn single(channel: ResistChannel, level: i32) -> Self {
        MonResists::NONE.with_level(channel, level)
    }

    /// Convert definition flags into levels.
    pub fn from_flags(flags: ResistFlags) -> Self {
        let mut out = MonResists::NONE;
        for &(channel, res, vul) in FLAG_TABLE {
            let mut level = 0;
            if flags.contains(res) {
                level += channel.default_level();
            }
            if !vul.is_empty() && flags.contains(vul) {
                level -= 1;
            }
            out = out.with_level(channel, level);
        }
        out
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MonResists {
    type Output = MonResists;

    /// Channel-wise saturating sum.
    fn bitor(self, rhs: MonResists) -> MonResists {
        ResistChannel::iter().fold(MonResists::NONE, |acc, ch| {
            acc.with_level(ch, self.level(ch) + rhs.level(ch))
        })
    }
}

impl BitOrAssign for MonResists {
    fn bitor_assign(&mut self, rhs: MonResists) {
        *self = *self | rhs;
    }
}

impl From<ResistFlags> for MonResists {
    fn from(flags: ResistFlags) -> Self {
        MonResists::from_flags(flags)
    }
}

impl fmt::Debug for MonResists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for ch in ResistChannel::iter() {
            let lvl = self.level(ch);
            if lvl != 0 {
                map.entry(&ch, &lvl);
            }
        }
        map.finish()
    }
}

/// Levels granted by a generic resistance status effect.
pub fn resistance_effect_bonus() -> MonResists {
    [
        ResistChannel::Fire,
        ResistChannel::Cold,
        ResistChannel::Elec,
        ResistChannel::Poison,
        ResistChannel::Negative,
    ]
    .into_iter()
    .fold(MonResists::NONE, |acc, ch| acc.with_level(ch, 1))
}

/// Scale damage of one channel by the defender's level in it.
///
/// Full resistance negates; partial resistance divides; vulnerability
/// multiplies by one and a half. Never returns a negative amount.
pub fn resist_adjust_damage(level: i32, damage: i32) -> i32 {
    let damage = damage.max(0);
    match level {
        l if l >= MAX_RESIST_LEVEL => 0,
        2 => damage / 3,
        1 => damage / 2,
        0 => damage,
        _ => damage * 3 / 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_roundtrip_through_packing() {
        let r = MonResists::NONE
            .with_level(ResistChannel::Fire, 2)
            .with_level(ResistChannel::Cold, -1)
            .with_level(ResistChannel::Constriction, 3);
        assert_eq!(r.level(ResistChannel::Fire), 2);
        assert_eq!(r.level(ResistChannel::Cold), -1);
        assert_eq!(r.level(ResistChannel::Constriction), 3);
        assert_eq!(r.level(ResistChannel::Elec), 0);
    }

    #[test]
    fn test_with_level_clamps() {
        let r = MonResists::single(ResistChannel::Poison, 9);
        assert_eq!(r.level(ResistChannel::Poison), MAX_RESIST_LEVEL);
        let r = MonResists::single(ResistChannel::Poison, -9);
        assert_eq!(r.level(ResistChannel::Poison), MIN_RESIST_LEVEL);
    }

    #[test]
    fn test_bitor_adds_per_channel() {
        let mut a = MonResists::single(ResistChannel::Fire, 1);
        a |= MonResists::single(ResistChannel::Fire, 1) | MonResists::single(ResistChannel::Cold, 1);
        assert_eq!(a.level(ResistChannel::Fire), 2);
        assert_eq!(a.level(ResistChannel::Cold), 1);
    }

    #[test]
    fn test_bitor_saturates() {
        let mut a = MonResists::single(ResistChannel::Elec, 3);
        a |= MonResists::single(ResistChannel::Elec, 2);
        assert_eq!(a.level(ResistChannel::Elec), 3);
        let mut b = MonResists::single(ResistChannel::Elec, -3);
        b |= MonResists::single(ResistChannel::Elec, -1);
        assert_eq!(b.level(ResistChannel::Elec), -3);
    }

    #[test]
    fn test_vulnerability_cancels_resistance() {
        let r = MonResists::from_flags(ResistFlags::RES_FIRE | ResistFlags::VUL_FIRE);
        assert_eq!(r.level(ResistChannel::Fire), 0);
        let r = MonResists::from_flags(ResistFlags::VUL_COLD | ResistFlags::RES_ACID);
        assert_eq!(r.level(ResistChannel::Cold), -1);
        assert_eq!(r.level(ResistChannel::Acid), MAX_RESIST_LEVEL);
    }

    #[test]
    fn test_adjust_damage() {
        assert_eq!(resist_adjust_damage(0, 12), 12);
        assert_eq!(resist_adjust_damage(1, 12), 6);
        assert_eq!(resist_adjust_damage(2, 12), 4);
        assert_eq!(resist_adjust_damage(3, 12), 0);
        assert_eq!(resist_adjust_damage(-1, 12), 18);
        assert_eq!(resist_adjust_damage(0, -4), 0);
    }

    #[test]
    fn test_flags_serde() {
        let flags = ResistFlags::RES_FIRE | ResistFlags::RES_NEG;
        let json = serde_json::to_string(&flags).unwrap();
        let back: ResistFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
