//! Spell lists for generated casters
//!
//! Ghosts remember a handful of the spells their player knew, picked from
//! fixed preference lists. Pandemonium lords roll from the same lists and
//! may also get monster-only spells.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::rng::GameRng;

/// Spells known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter)]
pub enum SpellType {
    // Conjurations
    CrystalSpear,
    BoltOfDraining,
    Agony,
    Disintegrate,
    LightningBolt,
    StickyFlame,
    MysticBlast,
    BoltOfMagma,
    IceBolt,
    BoltOfFire,
    BoltOfCold,
    Fireball,
    DelayedFireball,
    VenomBolt,
    BoltOfIron,
    StoneArrow,
    ThrowFlame,
    ThrowFrost,
    Pain,
    Sting,
    Shock,
    MagicDart,
    Backlight,

    // Summonings and self-enchantments
    SymbolOfTorment,
    SummonGreaterDemon,
    SummonHorribleThings,
    SummonWraiths,
    SummonDemon,
    DemonicHorde,
    Haste,
    AnimateDead,
    Invisibility,
    CallImp,
    SummonSmallMammal,
    ControlledBlink,
    Blink,
    TeleportSelf,

    // Hexes and utility
    Banishment,
    Paralyse,
    Confuse,
    Slow,
    PolymorphOther,
    TeleportOther,
    Dig,

    // Monster-only
    HellfireBurst,
    MetalSplinters,
    EnergyBolt,
    SteamBall,
    Hellfire,
    Smiting,
}

bitflags! {
    /// Who can use a spell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpellFlags: u8 {
        /// Players can learn it
        const PLAYER = 0x01;
        /// Monsters can cast it
        const MONSTER = 0x02;
        /// Never carried over to a ghost
        const NO_GHOST = 0x04;
        /// Escape spell, reserved for the emergency slot
        const ESCAPE = 0x08;
    }
}

impl SpellType {
    pub fn flags(self) -> SpellFlags {
        use SpellType::*;
        let both = SpellFlags::PLAYER | SpellFlags::MONSTER;
        match self {
            HellfireBurst | MetalSplinters | EnergyBolt | SteamBall | Hellfire | Smiting => {
                SpellFlags::MONSTER
            }
            // player-only, reachable through the remap table
            ControlledBlink => SpellFlags::PLAYER | SpellFlags::ESCAPE,
            DemonicHorde | Agony => SpellFlags::PLAYER,
            DelayedFireball | Invisibility => SpellFlags::PLAYER | SpellFlags::NO_GHOST,
            Blink | TeleportSelf => both | SpellFlags::ESCAPE,
            _ => both,
        }
    }

    pub fn monster_castable(self) -> bool {
        self.flags().contains(SpellFlags::MONSTER)
    }
}

/// One entry of a monster's spell book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonSpellSlot {
    pub spell: SpellType,
    /// Relative casting weight
    pub freq: i32,
    /// Only cast when badly hurt
    #[serde(default)]
    pub emergency: bool,
}

/// Conjurations, searched for the first two slots.
pub const SEARCH_ORDER_CONJ: &[SpellType] = &[
    SpellType::CrystalSpear,
    SpellType::BoltOfDraining,
    SpellType::Agony,
    SpellType::Disintegrate,
    SpellType::LightningBolt,
    SpellType::StickyFlame,
    SpellType::MysticBlast,
    SpellType::BoltOfMagma,
    SpellType::IceBolt,
    SpellType::BoltOfFire,
    SpellType::BoltOfCold,
    SpellType::Fireball,
    SpellType::DelayedFireball,
    SpellType::VenomBolt,
    SpellType::BoltOfIron,
    SpellType::StoneArrow,
    SpellType::ThrowFlame,
    SpellType::ThrowFrost,
    SpellType::Pain,
    SpellType::Sting,
    SpellType::Shock,
    SpellType::MagicDart,
    SpellType::Backlight,
];

/// Summonings and self-enchantments for the third slot.
pub const SEARCH_ORDER_THIRD: &[SpellType] = &[
    SpellType::SymbolOfTorment,
    SpellType::SummonGreaterDemon,
    SpellType::SummonHorribleThings,
    SpellType::SummonWraiths,
    SpellType::SummonDemon,
    SpellType::DemonicHorde,
    SpellType::Haste,
    SpellType::AnimateDead,
    SpellType::Invisibility,
    SpellType::CallImp,
    SpellType::SummonSmallMammal,
    SpellType::ControlledBlink,
    SpellType::Blink,
];

/// Hexes for the fourth and fifth slots.
pub const SEARCH_ORDER_MISC: &[SpellType] = &[
    SpellType::Agony,
    SpellType::Banishment,
    SpellType::Paralyse,
    SpellType::Confuse,
    SpellType::Slow,
    SpellType::PolymorphOther,
    SpellType::TeleportOther,
    SpellType::Dig,
    SpellType::Backlight,
];

/// Closest monster spell for a player spell.
pub fn translate_spell(spell: SpellType) -> SpellType {
    match spell {
        SpellType::ControlledBlink => SpellType::Blink,
        SpellType::DemonicHorde => SpellType::CallImp,
        SpellType::Agony | SpellType::SymbolOfTorment => SpellType::SymbolOfTorment,
        other => other,
    }
}

/// First spell of `list` the player knows, skipping `ignore`.
fn search_list(known: &[SpellType], list: &[SpellType], ignore: Option<SpellType>) -> Option<SpellType> {
    list.iter()
        .copied()
        .filter(|s| Some(*s) != ignore)
        .filter(|s| !s.flags().contains(SpellFlags::NO_GHOST))
        .find(|s| known.contains(s))
}

/// Pick the spells a ghost remembers, in slot order.
///
/// Slot six is the emergency escape. Empty slots are `None`.
pub fn ghost_spell_choices(known: &[SpellType]) -> [Option<SpellType>; 6] {
    let conj = |ignore| search_list(known, SEARCH_ORDER_CONJ, ignore);

    let first = conj(None);
    let second = conj(first);
    let third = search_list(known, SEARCH_ORDER_THIRD, None);
    let fourth = search_list(known, SEARCH_ORDER_MISC, None).or_else(|| conj(None));
    let mut fifth = conj(fourth);
    if known.contains(&SpellType::Dig) {
        fifth = Some(SpellType::Dig);
    }

    let mut emergency = None;
    if known.contains(&SpellType::ControlledBlink) || known.contains(&SpellType::Blink) {
        emergency = Some(SpellType::ControlledBlink);
    }
    if known.contains(&SpellType::TeleportSelf) {
        emergency = Some(SpellType::TeleportSelf);
    }

    [first, second, third, fourth, fifth, emergency]
}

/// Roll spells for a pandemonium lord, in slot order.
pub fn demon_spell_choices(rng: &mut GameRng) -> [Option<SpellType>; 6] {
    let mut slots = [None; 6];
    let pick = |rng: &mut GameRng, list: &[SpellType]| rng.choose(list).copied();

    if rng.coinflip() {
        slots[0] = pick(rng, SEARCH_ORDER_CONJ);
    }
    // may duplicate the first slot; dedup happens later
    if rng.coinflip() {
        slots[1] = pick(rng, SEARCH_ORDER_CONJ);
    }
    if !rng.one_chance_in(4) {
        slots[2] = pick(rng, SEARCH_ORDER_THIRD);
    }
    if rng.coinflip() {
        slots[3] = pick(rng, SEARCH_ORDER_MISC);
    }
    if rng.coinflip() {
        slots[4] = pick(rng, SEARCH_ORDER_MISC);
    }
    if rng.coinflip() {
        slots[5] = Some(SpellType::Blink);
    }
    if rng.coinflip() {
        slots[5] = Some(SpellType::TeleportSelf);
    }

    for slot in slots.iter_mut() {
        *slot = slot.map(translate_spell);
    }

    let overrides: [(usize, i32, SpellType); 10] = [
        (0, 25, SpellType::HellfireBurst),
        (0, 25, SpellType::MetalSplinters),
        (0, 25, SpellType::EnergyBolt),
        (1, 25, SpellType::SteamBall),
        (1, 25, SpellType::MysticBlast),
        (1, 25, SpellType::Hellfire),
        (2, 25, SpellType::Smiting),
        (2, 25, SpellType::HellfireBurst),
        (2, 12, SpellType::SummonGreaterDemon),
        (2, 12, SpellType::SummonDemon),
    ];
    for (slot, odds, spell) in overrides {
        if rng.one_chance_in(odds) {
            slots[slot] = Some(spell);
        }
    }
    if rng.one_chance_in(20) {
        slots[3] = Some(SpellType::SummonGreaterDemon);
    }
    if rng.one_chance_in(20) {
        slots[3] = Some(SpellType::SummonDemon);
    }
    // at least they can summon demons
    if slots[3].is_none() {
        slots[3] = Some(SpellType::SummonDemon);
    }
    if rng.one_chance_in(15) {
        slots[4] = Some(SpellType::Dig);
    }

    slots
}

/// Turn slot choices into a spell book.
///
/// Translates through the remap table, drops spells monsters cannot cast
/// and duplicates, then shares `total` frequency evenly between the rest.
pub fn build_spell_book(choices: &[Option<SpellType>], total: i32) -> Vec<MonSpellSlot> {
    let last = choices.len().saturating_sub(1);
    let mut book: Vec<MonSpellSlot> = Vec::new();
    for (i, choice) in choices.iter().enumerate() {
        let Some(spell) = choice.map(translate_spell) else {
            continue;
        };
        if !spell.monster_castable() || book.iter().any(|s| s.spell == spell) {
            continue;
        }
        book.push(MonSpellSlot {
            spell,
            freq: 0,
            emergency: i == last && spell.flags().contains(SpellFlags::ESCAPE),
        });
    }
    normalize_spell_freq(&mut book, total);
    book
}

/// Scale frequencies so they sum to exactly `total`.
///
/// Slots with no weight yet share evenly; leftover points go to the first
/// slots.
pub fn normalize_spell_freq(book: &mut [MonSpellSlot], total: i32) {
    if book.is_empty() || total <= 0 {
        return;
    }
    let current: i32 = book.iter().map(|s| s.freq.max(0)).sum();
    if current == 0 {
        for slot in book.iter_mut() {
            slot.freq = 1;
        }
    }
    let current: i32 = book.iter().map(|s| s.freq.max(0)).sum();
    let mut assigned = 0;
    for slot in book.iter_mut() {
        slot.freq = slot.freq.max(0) * total / current;
        assigned += slot.freq;
    }
    let n = book.len() as i32;
    let mut leftover = total - assigned;
    let mut i = 0;
    while leftover > 0 {
        book[(i % n) as usize].freq += 1;
        leftover -= 1;
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_translate_spell_targets_are_castable() {
        for spell in SpellType::iter() {
            let t = translate_spell(spell);
            if spell.flags().contains(SpellFlags::PLAYER) && !spell.flags().contains(SpellFlags::NO_GHOST) {
                assert!(t.monster_castable(), "{spell} maps to uncastable {t}");
            }
        }
        assert_eq!(translate_spell(SpellType::ControlledBlink), SpellType::Blink);
        assert_eq!(translate_spell(SpellType::Agony), SpellType::SymbolOfTorment);
    }

    #[test]
    fn test_ghost_choices_follow_preference() {
        let known = vec![
            SpellType::MagicDart,
            SpellType::Fireball,
            SpellType::Blink,
            SpellType::Confuse,
        ];
        let c = ghost_spell_choices(&known);
        assert_eq!(c[0], Some(SpellType::Fireball));
        assert_eq!(c[1], Some(SpellType::MagicDart));
        assert_eq!(c[2], Some(SpellType::Blink));
        assert_eq!(c[3], Some(SpellType::Confuse));
        assert_eq!(c[4], Some(SpellType::Fireball));
        assert_eq!(c[5], Some(SpellType::ControlledBlink));
    }

    #[test]
    fn test_no_ghost_spells_are_skipped() {
        let known = vec![SpellType::DelayedFireball, SpellType::Invisibility];
        let c = ghost_spell_choices(&known);
        assert!(c.iter().all(Option::is_none));
    }

    #[test]
    fn test_dig_takes_fifth_slot() {
        let known = vec![SpellType::Dig, SpellType::Shock];
        let c = ghost_spell_choices(&known);
        assert_eq!(c[3], Some(SpellType::Dig));
        assert_eq!(c[4], Some(SpellType::Dig));
    }

    #[test]
    fn test_spell_book_dedups_and_normalises() {
        let choices = [
            Some(SpellType::Agony),
            Some(SpellType::SymbolOfTorment),
            None,
            Some(SpellType::Slow),
            None,
            Some(SpellType::ControlledBlink),
        ];
        let book = build_spell_book(&choices, 200);
        let spells: Vec<SpellType> = book.iter().map(|s| s.spell).collect();
        assert_eq!(
            spells,
            vec![SpellType::SymbolOfTorment, SpellType::Slow, SpellType::Blink]
        );
        assert_eq!(book.iter().map(|s| s.freq).sum::<i32>(), 200);
        assert_eq!(book[0].freq, 67);
        assert!(book[2].emergency);
        assert!(!book[0].emergency);
    }

    #[test]
    fn test_normalise_keeps_ratios() {
        let mut book = vec![
            MonSpellSlot { spell: SpellType::Shock, freq: 30, emergency: false },
            MonSpellSlot { spell: SpellType::Slow, freq: 10, emergency: false },
        ];
        normalize_spell_freq(&mut book, 200);
        assert_eq!(book[0].freq, 150);
        assert_eq!(book[1].freq, 50);
    }

    #[test]
    fn test_demon_always_summons() {
        let mut rng = GameRng::always_max();
        let c = demon_spell_choices(&mut rng);
        assert_eq!(c[3], Some(SpellType::SummonDemon));
        let mut rng = GameRng::new(3);
        for _ in 0..50 {
            let c = demon_spell_choices(&mut rng);
            assert!(c[3].is_some());
        }
    }
}
