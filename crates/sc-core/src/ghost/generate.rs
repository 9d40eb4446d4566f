//! Profile generators
//!
//! Each generator has its own formula. They share one contract: the result
//! is clamped to the configured caps before it is handed back.

use tracing::debug;

use super::spells::{build_spell_book, demon_spell_choices, ghost_spell_choices};
use super::{GhostDemon, GhostKind, MonColour};
use crate::actor::{Actor, Player, Skill, Weapon};
use crate::combat::{AttackFlavour, Brand, MonAttackKind};
use crate::config::CombatConfig;
use crate::consts::MAX_GHOST_NAME;
use crate::error::GhostError;
use crate::message::capitalise;
use crate::resist::{MAX_RESIST_LEVEL, MonResists, ResistChannel};
use crate::rng::GameRng;

/// Ghost melee damage never exceeds this, whatever the caps allow.
const GHOST_DAMAGE_LIMIT: i32 = 50;
/// Nor does ghost evasion.
const GHOST_EV_LIMIT: i32 = 40;
/// Power budget for animated weapons.
const MAX_WEAPON_POWER: i32 = 100;

const NAME_CONSONANTS: &[&str] = &[
    "b", "c", "d", "f", "g", "h", "j", "k", "l", "m", "n", "p", "r", "s", "t", "v", "x", "z",
    "th", "sh", "gr", "kr", "zh", "ph",
];
const NAME_VOWELS: &[&str] = &["a", "e", "i", "o", "u", "y", "ae", "ou", "ia"];

const DEMON_COLOURS: &[MonColour] = &[
    MonColour::Red,
    MonColour::Blue,
    MonColour::Yellow,
    MonColour::Magenta,
    MonColour::Green,
    MonColour::Cyan,
    MonColour::White,
    MonColour::Brown,
];

/// A pronounceable random name, capitalised.
pub fn make_name(rng: &mut GameRng) -> String {
    let syllables = 2 + rng.random2(3);
    let vowel_first = rng.one_chance_in(4);
    let mut name = String::new();
    for i in 0..syllables {
        if i > 0 || !vowel_first {
            name.push_str(rng.choose(NAME_CONSONANTS).copied().unwrap_or("k"));
        }
        name.push_str(rng.choose(NAME_VOWELS).copied().unwrap_or("a"));
    }
    if rng.coinflip() {
        name.push_str(rng.choose(NAME_CONSONANTS).copied().unwrap_or("k"));
    }
    let name: String = name.chars().take(MAX_GHOST_NAME).collect();
    capitalise(&name)
}

/// Natural attack flavour that carries a weapon brand's effect.
pub fn brand_flavour(brand: Brand) -> AttackFlavour {
    match brand {
        Brand::Flaming | Brand::FoulFlame => AttackFlavour::Fire,
        Brand::Freezing => AttackFlavour::Cold,
        Brand::Electrocution => AttackFlavour::Elec,
        Brand::Venom => AttackFlavour::Poison,
        Brand::Draining => AttackFlavour::Drain,
        Brand::Vampirism => AttackFlavour::Vampiric,
        Brand::Pain => AttackFlavour::Pain,
        Brand::HolyWrath => AttackFlavour::Holy,
        Brand::Normal | Brand::Antimagic | Brand::Chaos => AttackFlavour::Plain,
    }
}

fn ghost_brand(brand: Brand) -> Brand {
    if brand.legal_for_ghost() { brand } else { Brand::Normal }
}

// ============================================================================
// Player ghosts
// ============================================================================

/// Melee damage a ghost inherits from its player.
fn player_ghost_damage(player: &Player) -> i32 {
    let mut d = match &player.weapon {
        Some(w) => w.damage * (25 + player.skill(w.skill)) / 25,
        None => {
            let mut d = 4;
            if player.species.eq_ignore_ascii_case("troll") {
                d += player.xl;
            }
            d + player.skill(Skill::Unarmed)
        }
    };
    d = d * (30 + player.skill(Skill::Fighting)) / 30;
    d += player.strength / 4;
    d.min(GHOST_DAMAGE_LIMIT)
}

/// The ghost a dead player leaves behind.
pub fn init_player_ghost(player: &Player, config: &CombatConfig) -> GhostDemon {
    let mut g = GhostDemon::new(GhostKind::PlayerGhost, player.name.clone());
    g.species = player.species.clone();
    g.job = player.job.clone();
    g.xl = player.xl;
    g.max_hp = player.max_hp;
    g.ev = player.evasion().min(GHOST_EV_LIMIT);
    g.ac = player.armour_class();
    g.see_invis = player.see_invisible();
    g.speed = player.base_speed;
    g.damage = player_ghost_damage(player);
    g.brand = ghost_brand(player.weapon.as_ref().map_or(Brand::Normal, |w| w.brand));
    g.att_flav = brand_flavour(g.brand);
    if let Some((skill, level)) = player.best_skill() {
        g.best_skill = Some(skill);
        g.best_skill_level = level;
    }

    // elemental resistances carry over; undeath adds the rest
    let r = player.resists();
    g.resists = [ResistChannel::Fire, ResistChannel::Cold, ResistChannel::Elec]
        .into_iter()
        .fold(MonResists::NONE, |acc, ch| acc.with_level(ch, r.level(ch)))
        .with_level(ResistChannel::Poison, 1)
        .with_level(ResistChannel::Negative, MAX_RESIST_LEVEL);

    g.colour = MonColour::White;
    g.flies = true;
    g.spells = build_spell_book(&ghost_spell_choices(&player.spells), config.spell_freq_total);

    g.clamp_to_caps(config);
    debug!(name = %g.name, xl = g.xl, damage = g.damage, spells = g.spells.len(), "player ghost");
    g
}

// ============================================================================
// Pandemonium lords
// ============================================================================

/// A random unique demon lord.
pub fn init_pandemonium_lord(rng: &mut GameRng, config: &CombatConfig) -> GhostDemon {
    let name = make_name(rng);
    let mut g = GhostDemon::new(GhostKind::PandemoniumLord, name);

    g.max_hp = 100 + rng.roll_dice(3, 50);
    g.ev = 5 + rng.random2(20);
    g.ac = 5 + rng.random2(20);
    g.see_invis = !rng.one_chance_in(10);

    let fire = if !rng.one_chance_in(3) {
        if rng.coinflip() { 2 } else { 3 }
    } else if rng.one_chance_in(10) {
        -1
    } else {
        0
    };
    let cold = if !rng.one_chance_in(3) {
        2
    } else if rng.one_chance_in(10) {
        -1
    } else {
        0
    };
    let elec = if !rng.one_chance_in(3) { 1 } else { 0 };
    g.resists = MonResists::NONE
        .with_level(ResistChannel::Fire, fire)
        .with_level(ResistChannel::Cold, cold)
        .with_level(ResistChannel::Elec, elec)
        .with_level(ResistChannel::Poison, 1)
        .with_level(ResistChannel::Negative, MAX_RESIST_LEVEL);

    g.damage = 20 + rng.roll_dice(2, 20);
    if !rng.one_chance_in(3) {
        g.brand = rng.choose(&Brand::DEMONIC).copied().unwrap_or(Brand::Normal);
    }
    g.att_flav = brand_flavour(g.brand);

    let spellcaster = !rng.one_chance_in(10);
    g.flies = !rng.one_chance_in(3);
    g.xl = 10 + rng.roll_dice(2, 10);
    g.speed = if rng.one_chance_in(3) {
        8 + rng.roll_dice(2, 5)
    } else {
        10
    };
    g.cycle_colours = rng.one_chance_in(10);
    g.colour = rng.choose(DEMON_COLOURS).copied().unwrap_or(MonColour::Red);

    if spellcaster {
        g.spells = build_spell_book(&demon_spell_choices(rng), config.spell_freq_total);
    }

    g.clamp_to_caps(config);
    debug!(name = %g.name, xl = g.xl, brand = %g.brand, spells = g.spells.len(), "pandemonium lord");
    g
}

// ============================================================================
// Animated weapons
// ============================================================================

/// A weapon brought to life. Power is capped at 100.
///
/// Heavier (harder-hitting) weapons are tougher and slower but easier to
/// hit.
pub fn init_dancing_weapon(weapon: &Weapon, power: i32, config: &CombatConfig) -> GhostDemon {
    let power = power.clamp(0, MAX_WEAPON_POWER);
    let mut g = GhostDemon::new(GhostKind::DancingWeapon, weapon.name.clone());

    g.xl = (power / 6).clamp(1, 15);
    g.max_hp = power * 3 / 4 + weapon.damage * 2;
    g.ac = weapon.damage / 2 + power / 25;
    g.ev = 25 - weapon.damage + power / 20;
    g.speed = 10 + power / 25 - weapon.damage / 10;
    g.damage = (weapon.damage + weapon.plus) * (100 + power) / 100;
    g.brand = ghost_brand(weapon.brand);
    g.att_flav = brand_flavour(g.brand);
    g.resists = MonResists::NONE
        .with_level(ResistChannel::Poison, 1)
        .with_level(ResistChannel::Negative, MAX_RESIST_LEVEL);
    g.flies = true;

    g.clamp_to_caps(config);
    debug!(name = %g.name, power, xl = g.xl, damage = g.damage, "dancing weapon");
    g
}

/// A spectral copy of the player's wielded weapon.
///
/// Fails when nothing is wielded.
pub fn init_spectral_weapon(
    player: &Player,
    power: i32,
    config: &CombatConfig,
) -> Result<GhostDemon, GhostError> {
    let Some(weapon) = player.weapon.as_ref() else {
        return Err(GhostError::Inconsistent {
            kind: GhostKind::SpectralWeapon,
            reason: format!("{} has no weapon to copy", player.name),
        });
    };
    let power = power.clamp(0, MAX_WEAPON_POWER);
    let damage = weapon.damage + weapon.plus.max(0);

    let mut g = GhostDemon::new(GhostKind::SpectralWeapon, format!("spectral {}", weapon.name));
    // accuracy 3..15, hp 10..70, damage 3/5..7/5 of the weapon
    g.xl = 3 + power * 12 / 100;
    g.max_hp = 10 + power * 60 / 100;
    g.damage = damage * 3 / 5 + damage * 4 * power / 500;
    g.ac = 2 + power * 8 / 100;
    g.ev = 10 + power * 20 / 100;
    g.speed = 30;
    g.brand = ghost_brand(weapon.brand);
    g.att_type = MonAttackKind::Hit;
    g.att_flav = brand_flavour(g.brand);
    g.resists = MonResists::NONE
        .with_level(ResistChannel::Poison, 1)
        .with_level(ResistChannel::Negative, MAX_RESIST_LEVEL);
    g.see_invis = true;
    g.flies = true;
    g.colour = MonColour::Cyan;

    g.clamp_to_caps(config);
    debug!(name = %g.name, power, damage = g.damage, "spectral weapon");
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::SpellType;

    fn fighter() -> Player {
        Player::new("Hero")
            .with_hp(50)
            .with_xl(10)
            .with_stats(16, 12, 8)
            .with_skill(Skill::Fighting, 10)
            .with_skill(Skill::LongBlades, 10)
            .with_weapon(Weapon::new("long sword", Skill::LongBlades, 10))
    }

    #[test]
    fn test_player_ghost_weapon_damage() {
        let config = CombatConfig::default();
        let g = init_player_ghost(&fighter(), &config);
        // 10 * 35/25 = 14, * 40/30 = 18, + 16/4
        assert_eq!(g.damage, 22);
        assert_eq!(g.max_hp, 50);
        assert_eq!(g.xl, 10);
        assert_eq!(g.best_skill, Some(Skill::Fighting));
        assert_eq!(g.best_skill_level, 10);
        assert_eq!(g.name, "Hero");
        assert_eq!(g.validate(&config), Ok(()));
    }

    #[test]
    fn test_troll_ghost_punches_harder() {
        let config = CombatConfig::default();
        let troll = Player::new("Grunk")
            .with_species("Troll", "Monk")
            .with_xl(10)
            .with_stats(20, 8, 4)
            .with_skill(Skill::Unarmed, 5);
        let g = init_player_ghost(&troll, &config);
        assert_eq!(g.damage, 4 + 10 + 5 + 5);
        assert_eq!(g.brand, Brand::Normal);
    }

    #[test]
    fn test_player_ghost_respects_caps() {
        let config = CombatConfig::default();
        let mut p = fighter()
            .with_hp(1000)
            .with_ev(90)
            .with_weapon(Weapon::new("holy blade", Skill::LongBlades, 40).with_brand(Brand::HolyWrath))
            .with_skill(Skill::LongBlades, 27)
            .with_skill(Skill::Fighting, 27);
        p.name = "A very long player name indeed".to_string();
        let g = init_player_ghost(&p, &config);
        assert_eq!(g.max_hp, 400);
        assert_eq!(g.ev, 40);
        assert_eq!(g.damage, 50);
        assert_eq!(g.brand, Brand::Normal);
        assert_eq!(g.name.chars().count(), MAX_GHOST_NAME);
        assert_eq!(g.validate(&config), Ok(()));
    }

    #[test]
    fn test_player_ghost_remembers_spells() {
        let config = CombatConfig::default();
        let p = fighter().with_spells(vec![
            SpellType::MagicDart,
            SpellType::Agony,
            SpellType::ControlledBlink,
        ]);
        let g = init_player_ghost(&p, &config);
        let spells: Vec<SpellType> = g.spells.iter().map(|s| s.spell).collect();
        assert!(spells.contains(&SpellType::SymbolOfTorment));
        assert!(spells.contains(&SpellType::Blink));
        assert!(!spells.contains(&SpellType::Agony));
        assert_eq!(g.spells.iter().map(|s| s.freq).sum::<i32>(), config.spell_freq_total);
        assert_eq!(g.validate(&config), Ok(()));
    }

    #[test]
    fn test_pan_lord_extremes_validate() {
        let config = CombatConfig::default();
        let hi = init_pandemonium_lord(&mut GameRng::always_max(), &config);
        assert_eq!(hi.max_hp, 250);
        assert_eq!(hi.damage, 60);
        assert_eq!(hi.xl, 27);
        assert_eq!(hi.brand, Brand::Chaos);
        assert!(!hi.spells.is_empty());
        assert_eq!(hi.validate(&config), Ok(()));

        let lo = init_pandemonium_lord(&mut GameRng::always_min(), &config);
        assert_eq!(lo.max_hp, 103);
        assert!(lo.spells.is_empty());
        assert_eq!(lo.validate(&config), Ok(()));
    }

    #[test]
    fn test_pan_lords_vary_by_seed() {
        let config = CombatConfig::default();
        let a = init_pandemonium_lord(&mut GameRng::new(1), &config);
        let b = init_pandemonium_lord(&mut GameRng::new(1), &config);
        assert_eq!(a, b);
        for seed in 0..100 {
            let g = init_pandemonium_lord(&mut GameRng::new(seed), &config);
            assert_eq!(g.validate(&config), Ok(()), "seed {seed}");
            assert!(g.resists.level(ResistChannel::Poison) > 0);
        }
    }

    #[test]
    fn test_make_name_shape() {
        let mut rng = GameRng::new(7);
        for _ in 0..50 {
            let n = make_name(&mut rng);
            assert!(!n.is_empty());
            assert!(n.chars().count() <= MAX_GHOST_NAME);
            assert!(n.chars().next().is_some_and(|c| c.is_uppercase()));
        }
    }

    #[test]
    fn test_dancing_weapon_power_is_capped() {
        let config = CombatConfig::default();
        let w = Weapon::new("great mace", Skill::MacesFlails, 17).with_brand(Brand::HolyWrath);
        let full = init_dancing_weapon(&w, 100, &config);
        let over = init_dancing_weapon(&w, 500, &config);
        assert_eq!(full, over);
        assert!(full.flies);
        assert_eq!(full.brand, Brand::Normal);
        assert_eq!(full.damage, 34);
        assert_eq!(full.validate(&config), Ok(()));

        let weak = init_dancing_weapon(&w, 0, &config);
        assert!(weak.max_hp < full.max_hp);
        assert_eq!(weak.validate(&config), Ok(()));
    }

    #[test]
    fn test_spectral_weapon_needs_a_weapon() {
        let config = CombatConfig::default();
        let unarmed = Player::new("Hero");
        assert!(matches!(
            init_spectral_weapon(&unarmed, 50, &config),
            Err(GhostError::Inconsistent { kind: GhostKind::SpectralWeapon, .. })
        ));

        let armed = Player::new("Hero")
            .with_weapon(Weapon::new("spear", Skill::Polearms, 10).with_brand(Brand::Freezing));
        let g = init_spectral_weapon(&armed, 100, &config).unwrap();
        assert_eq!(g.damage, 14);
        assert_eq!(g.max_hp, 70);
        assert_eq!(g.att_flav, AttackFlavour::Cold);
        assert_eq!(g.name, "spectral spear");
        assert_eq!(g.validate(&config), Ok(()));
    }
}
