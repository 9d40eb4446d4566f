//! Property-based tests for the engine invariants.
//!
//! Run with: cargo test --release -p sc-core --test properties

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use strum::IntoEnumIterator;

use sc_core::actor::{
    Attitude, EffectSource, MonAttack, Monster, MonsterType, Player, Shield, Skill, Weapon,
};
use sc_core::aura::{aura_for, mons_update_aura};
use sc_core::combat::{
    AcRule, Attack, AttackFlavour, AttackOptions, Brand, MonAttackKind, ac_damage_var,
};
use sc_core::constrict::{
    ConstrictType, attempt_escape, handle_constriction, links_consistent, start_constricting,
    stop_constricting,
};
use sc_core::enchant::{EnchantKind, MonEnchant, decay_enchantment};
use sc_core::ghost::{
    SpellType, UGLY_THING_COLOURS, init_dancing_weapon, init_pandemonium_lord, init_player_ghost,
    init_spectral_weapon, init_ugly_thing,
};
use sc_core::random_var::RandomVar;
use sc_core::world::Coord;
use sc_core::{CombatConfig, DeathCause, GameRng, GameSession, Mid, Responsible};

fn coiler(at: Coord) -> Monster {
    Monster::new(MonsterType::Naga, "naga")
        .with_hp(60)
        .with_attack(MonAttack::new(MonAttackKind::Constrict, AttackFlavour::Constrict, 3))
        .at(at)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A lists B as a victim exactly when B names A as its constrictor,
    /// whatever sequence of holds, releases, escapes and deaths happens.
    #[test]
    fn prop_constriction_links_stay_bidirectional(
        seed in any::<u64>(),
        ops in prop::collection::vec((0u8..5, 0usize..4, 0usize..4), 1..40)
    ) {
        let mut session = GameSession::new(seed);
        let cells = [Coord::new(0, 0), Coord::new(1, 0), Coord::new(0, 1), Coord::new(1, 1)];
        let mids: Vec<Mid> = cells
            .iter()
            .map(|&c| session.world.add_monster(coiler(c)))
            .collect();

        for (op, a, b) in ops {
            let (a, b) = (mids[a], mids[b]);
            match op {
                0 => {
                    let _ = start_constricting(&mut session, a, b, ConstrictType::Melee, None);
                }
                1 => {
                    stop_constricting(&mut session, a, b, true);
                }
                2 => {
                    let _ = attempt_escape(&mut session, a);
                }
                3 => {
                    let _ = handle_constriction(&mut session, a);
                }
                _ => {
                    session.monster_die(a, DeathCause::Melee, Responsible::Unattributed);
                }
            }
            prop_assert!(links_consistent(&session.world));
        }
    }

    /// Reapplying a kind merges: one instance, the longer duration, degree
    /// summed up to the cap.
    #[test]
    fn prop_enchantment_merge_is_idempotent(
        kind_idx in 0usize..64,
        d1 in 1i32..500,
        d2 in 1i32..500,
        c1 in 1i32..10,
        c2 in 1i32..10
    ) {
        let kinds: Vec<EnchantKind> = EnchantKind::iter().collect();
        let kind = kinds[kind_idx % kinds.len()];
        let mut m = Monster::new(MonsterType::Generic, "orc");
        let first = MonEnchant::new(kind, c1, EffectSource::NONE, d1);
        let second = MonEnchant::new(kind, c2, EffectSource::NONE, d2);
        let expected_degree = (first.degree + second.degree).min(kind.max_degree());

        prop_assume!(m.add_ench(first));
        prop_assert!(m.add_ench(second));

        let count = m.enchantments.iter().filter(|e| e.kind == kind).count();
        prop_assert_eq!(count, 1);
        let e = m.get_ench(kind).unwrap();
        prop_assert_eq!(e.duration, d1.max(d2));
        prop_assert_eq!(e.degree, expected_degree);
        prop_assert!(e.degree <= kind.max_degree());
    }

    /// However often an aura ticks, the effect it leaves is exactly its
    /// base duration.
    #[test]
    fn prop_aura_refresh_never_stacks(
        seed in any::<u64>(),
        decays in prop::collection::vec(0usize..3, 1..15)
    ) {
        let mut session = GameSession::new(seed);
        let snail = session.world.add_monster(
            Monster::new(MonsterType::TorporSnail, "torpor snail")
                .with_attitude(Attitude::Friendly)
                .at(Coord::new(0, 0)),
        );
        let orc = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "orc").at(Coord::new(2, 2)));
        let base = aura_for(MonsterType::TorporSnail).unwrap().base_duration;

        for n in decays {
            mons_update_aura(&mut session, snail).unwrap();
            for _ in 0..n {
                decay_enchantment(&mut session, orc, EnchantKind::Slow, false).unwrap();
            }
        }
        mons_update_aura(&mut session, snail).unwrap();
        let left = session
            .world
            .monster(orc)
            .unwrap()
            .get_ench(EnchantKind::Slow)
            .map(|e| e.duration);
        prop_assert_eq!(left, Some(base));
    }

    /// A forced miss or a forced block leaves the defender untouched.
    #[test]
    fn prop_miss_and_block_are_pure(
        seed in any::<u64>(),
        hp in 1i32..100,
        ac in 0i32..30,
        ev in 0i32..30,
        block in any::<bool>()
    ) {
        let mut session = GameSession::new(seed);
        session.world.set_player(
            Player::new("Hero").with_weapon(Weapon::new("axe", Skill::Axes, 11)),
        );
        let target = session.world.add_monster(
            Monster::new(MonsterType::Generic, "orc")
                .with_hp(hp)
                .with_ac(ac)
                .with_ev(ev)
                .with_shield(Shield::new("buckler", 4))
                .at(Coord::new(1, 0)),
        );
        let before = session.world.monster(target).unwrap().clone();
        let options = if block {
            AttackOptions::always_hit().with_forced_block(true)
        } else {
            AttackOptions::always_miss()
        };

        let outcome = Attack::melee(&session, Mid::PLAYER, target)
            .unwrap()
            .with_options(options)
            .attack(&mut session)
            .unwrap();
        prop_assert!(!outcome.hit || outcome.blocked);

        let after = session.world.monster(target).unwrap();
        prop_assert_eq!(after.hp, before.hp);
        prop_assert_eq!(&after.enchantments, &before.enchantments);
        prop_assert_eq!(&after.constriction, &before.constriction);
    }

    /// More armour never means more expected damage, and damage is never
    /// negative.
    #[test]
    fn prop_ac_is_monotonic(
        dice in 1i32..4,
        size in 1i32..20,
        ac in 0i32..40,
        gdr in 0i32..60,
        rule_idx in 0usize..4
    ) {
        let rule = AcRule::iter().nth(rule_idx).unwrap();
        let raw = RandomVar::roll_dice(dice, size);
        let lower = ac_damage_var(&raw, ac, gdr, rule);
        let higher = ac_damage_var(&raw, ac + 1, gdr, rule);
        prop_assert!(lower.min() >= 0);
        prop_assert!(higher.min() >= 0);
        prop_assert!(higher.expected() <= lower.expected() + 1e-9);
    }

    #[test]
    fn prop_pandemonium_lords_respect_caps(seed in any::<u64>()) {
        let config = CombatConfig::default();
        let g = init_pandemonium_lord(&mut GameRng::new(seed), &config);
        prop_assert_eq!(g.validate(&config), Ok(()));
        prop_assert!(g.brand != Brand::HolyWrath);
    }

    #[test]
    fn prop_ugly_things_respect_caps(
        seed in any::<u64>(),
        very in any::<bool>(),
        colour in prop::option::of(0usize..6)
    ) {
        let config = CombatConfig::default();
        let colour = colour.map(|i| UGLY_THING_COLOURS[i]);
        let g = init_ugly_thing(&mut GameRng::new(seed), very, colour, &config);
        prop_assert_eq!(g.validate(&config), Ok(()));
        if let Some(c) = colour {
            prop_assert_eq!(g.colour, c);
        }
    }

    #[test]
    fn prop_player_ghosts_respect_caps(
        hp in 1i32..2000,
        xl in 1i32..28,
        strength in 1i32..60,
        ev in 0i32..100,
        ac in 0i32..100,
        speed in 1i32..40,
        fighting in 0i32..28,
        weapon_damage in prop::option::of(1i32..60),
        brand_idx in 0usize..12,
        spell_mask in any::<u64>()
    ) {
        let config = CombatConfig::default();
        let spells: Vec<SpellType> = SpellType::iter()
            .enumerate()
            .filter(|(i, _)| spell_mask & (1 << (i % 64)) != 0)
            .map(|(_, s)| s)
            .collect();
        let brand = Brand::iter().nth(brand_idx % Brand::iter().count()).unwrap();
        let mut p = Player::new("Hero")
            .with_hp(hp)
            .with_xl(xl)
            .with_stats(strength, 10, 10)
            .with_ev(ev)
            .with_ac(ac)
            .with_skill(Skill::Fighting, fighting)
            .with_skill(Skill::LongBlades, fighting)
            .with_spells(spells);
        p.base_speed = speed;
        if let Some(d) = weapon_damage {
            p = p.with_weapon(Weapon::new("sword", Skill::LongBlades, d).with_brand(brand));
        }
        let g = init_player_ghost(&p, &config);
        prop_assert_eq!(g.validate(&config), Ok(()));
    }

    #[test]
    fn prop_animated_weapons_respect_caps(
        damage in 1i32..60,
        plus in -5i32..15,
        power in -50i32..500,
        brand_idx in 0usize..12
    ) {
        let config = CombatConfig::default();
        let brand = Brand::iter().nth(brand_idx % Brand::iter().count()).unwrap();
        let weapon = Weapon::new("executioner's axe", Skill::Axes, damage)
            .with_plus(plus)
            .with_brand(brand);

        let dancing = init_dancing_weapon(&weapon, power, &config);
        prop_assert_eq!(dancing.validate(&config), Ok(()));

        let wielder = Player::new("Hero").with_weapon(weapon);
        let spectral = init_spectral_weapon(&wielder, power, &config).unwrap();
        prop_assert_eq!(spectral.validate(&config), Ok(()));
    }
}
