//! Brand damage and on-hit side effects
//!
//! Brand damage is extra damage folded into the Hit phase. Side effects
//! (poison, paralysis, holds, life drain) fire in the Damaged phase and only
//! when the defender actually took damage and survived.

use crate::actor::{Actor, EffectSource, Mid};
use crate::constrict::{self, ConstrictType};
use crate::consts::BASELINE_DELAY;
use crate::enchant::{EnchantKind, MonEnchant};
use crate::message::{MsgChannel, capitalise, the_name};
use crate::resist::resist_adjust_damage;
use crate::rng::GameRng;
use crate::session::GameSession;

use super::strategy::AttackSnapshot;
use super::{AttackFlavour, Brand, HitEffect, MissileBrand};

/// Pending message, flushed at the end of the attack.
pub(crate) type Line = (MsgChannel, String);

/// Minimum and extra damage of an electrocution discharge.
const ELEC_BASE: i32 = 8;
const ELEC_EXTRA: i32 = 13;

fn elemental(rng: &mut GameRng, level: i32, damage: i32) -> i32 {
    resist_adjust_damage(level, rng.random2(damage) / 2 + 1)
}

/// Extra damage from the attacker's brand, flavour or ammunition against
/// this defender. `damage` is the damage left after armour.
pub(crate) fn brand_bonus(rng: &mut GameRng, snap: &AttackSnapshot, defender: &dyn Actor, damage: i32) -> i32 {
    if damage <= 0 {
        return 0;
    }
    let mut special = match snap.brand {
        Brand::Flaming => elemental(rng, defender.res_fire(), damage),
        Brand::Freezing => elemental(rng, defender.res_cold(), damage),
        Brand::Electrocution => {
            if rng.one_chance_in(3) {
                resist_adjust_damage(defender.res_elec(), ELEC_BASE + rng.random2(ELEC_EXTRA))
            } else {
                0
            }
        }
        Brand::HolyWrath if defender.holy_wrath_susceptible() => 1 + rng.random2(damage * 15) / 10,
        Brand::Pain if defender.res_negative() <= 0 && defender.is_living() => {
            let power = if snap.attacker_is_player { snap.necromancy } else { snap.level };
            rng.random2(power + 1)
        }
        Brand::FoulFlame if !defender.undead_or_demonic() => {
            let base = elemental(rng, defender.res_fire(), damage);
            if defender.holiness() == crate::actor::Holiness::Holy {
                base * 3 / 2
            } else {
                base
            }
        }
        _ => 0,
    };

    special += match snap.missile_brand {
        MissileBrand::Flame => elemental(rng, defender.res_fire(), damage),
        MissileBrand::Frost => elemental(rng, defender.res_cold(), damage),
        MissileBrand::Silver if defender.undead_or_demonic() => damage / 3 + 1,
        _ => 0,
    };

    let level = snap.level.max(1);
    special += match snap.flavour {
        AttackFlavour::Fire => resist_adjust_damage(defender.res_fire(), level + rng.random2(level)),
        AttackFlavour::Cold => resist_adjust_damage(defender.res_cold(), level + rng.random2(level)),
        AttackFlavour::Elec => resist_adjust_damage(defender.res_elec(), level + rng.random2(level / 2 + 1)),
        AttackFlavour::Holy if defender.holy_wrath_susceptible() => 1 + rng.random2(level * 3 / 2),
        AttackFlavour::Pain if defender.res_negative() <= 0 && defender.is_living() => {
            1 + rng.random2(level)
        }
        _ => 0,
    };
    special.max(0)
}

fn affected(defender: &dyn Actor, what: &str) -> String {
    format!(
        "{} {} {}.",
        capitalise(&the_name(defender)),
        if defender.is_player() { "are" } else { "is" },
        what
    )
}

/// Heal the attacker off a living defender. Returns HP gained.
fn drink(session: &mut GameSession, attacker: Mid, defender: Mid, damage_done: i32) -> i32 {
    let living = session.world.actor(defender).is_some_and(|d| d.is_living());
    if !living || damage_done <= 0 {
        return 0;
    }
    let amount = 1 + session.rng.random2(damage_done) / 2;
    session.world.actor_mut(attacker).map_or(0, |a| a.heal(amount))
}

/// Fire the side effects of a connecting hit. Messages are appended to
/// `out`, except for holds, which announce themselves.
pub(crate) fn on_hit_effects(
    session: &mut GameSession,
    attacker: Mid,
    defender: Mid,
    snap: &AttackSnapshot,
    damage_done: i32,
    out: &mut Vec<Line>,
) -> Vec<HitEffect> {
    let mut effects = Vec::new();
    if damage_done <= 0 {
        return effects;
    }
    let Some(source) = session.world.actor(attacker).map(|a| EffectSource::of(&**a)) else {
        return effects;
    };

    weapon_brand_effects(session, attacker, defender, snap, source, damage_done, out, &mut effects);
    missile_brand_effects(session, defender, snap, source, out, &mut effects);
    flavour_effects(session, attacker, defender, snap, source, damage_done, out, &mut effects);
    effects
}

#[allow(clippy::too_many_arguments)]
fn weapon_brand_effects(
    session: &mut GameSession,
    attacker: Mid,
    defender: Mid,
    snap: &AttackSnapshot,
    source: EffectSource,
    damage_done: i32,
    out: &mut Vec<Line>,
    effects: &mut Vec<HitEffect>,
) {
    match snap.brand {
        Brand::Venom => {
            if session.rng.one_chance_in(4) {
                return;
            }
            let amount = 1 + session.rng.random2(3);
            if let Some(d) = session.world.actor_mut(defender)
                && d.poison(source, amount)
            {
                out.push((MsgChannel::Status, affected(&**d, "poisoned")));
                effects.push(HitEffect::Poisoned);
            }
        }
        Brand::Draining => {
            if !session.rng.coinflip() {
                return;
            }
            if let Some(d) = session.world.actor_mut(defender)
                && d.is_living()
                && d.drain(source, 1)
            {
                out.push((MsgChannel::Status, affected(&**d, "drained")));
                effects.push(HitEffect::Drained);
            }
        }
        Brand::Vampirism => {
            if !session.rng.x_chance_in_y(3, 5) {
                return;
            }
            let healed = drink(session, attacker, defender, damage_done);
            if healed > 0 {
                if let Some(a) = session.world.actor(attacker) {
                    out.push((
                        MsgChannel::Status,
                        format!(
                            "{} {} healthier.",
                            capitalise(&the_name(&**a)),
                            if a.is_player() { "feel" } else { "looks" }
                        ),
                    ));
                }
                effects.push(HitEffect::AttackerHealed(healed));
            }
        }
        Brand::Antimagic => {
            let duration = (damage_done * 2 + 10) * BASELINE_DELAY / 2;
            if let Some(m) = session.world.monster_mut(defender)
                && !m.spells.is_empty()
                && m.add_ench(MonEnchant::new(EnchantKind::Antimagic, 1, source, duration))
            {
                out.push((MsgChannel::Status, affected(&*m, "no longer able to cast")));
                effects.push(HitEffect::Antimagic);
            }
        }
        _ => {}
    }
}

fn missile_brand_effects(
    session: &mut GameSession,
    defender: Mid,
    snap: &AttackSnapshot,
    source: EffectSource,
    out: &mut Vec<Line>,
    effects: &mut Vec<HitEffect>,
) {
    match snap.missile_brand {
        MissileBrand::Poisoned => {
            if session.rng.one_chance_in(4) {
                return;
            }
            let amount = 2 + session.rng.random2(3);
            if let Some(d) = session.world.actor_mut(defender)
                && d.poison(source, amount)
            {
                out.push((MsgChannel::Status, affected(&**d, "poisoned")));
                effects.push(HitEffect::Poisoned);
            }
        }
        MissileBrand::Curare => {
            let amount = 4 + session.rng.random2(4);
            let slow = (2 + session.rng.random2(3)) * BASELINE_DELAY;
            if let Some(d) = session.world.actor_mut(defender)
                && d.poison(source, amount)
            {
                out.push((MsgChannel::Status, affected(&**d, "poisoned")));
                effects.push(HitEffect::Poisoned);
                if d.slow_down(source, slow) {
                    effects.push(HitEffect::Slowed);
                }
            }
        }
        MissileBrand::Frenzy => {
            let duration = (5 + session.rng.random2(5)) * BASELINE_DELAY;
            if let Some(m) = session.world.monster_mut(defender)
                && m.is_living()
                && !m.has_ench(EnchantKind::Berserk)
                && m.add_ench(MonEnchant::new(EnchantKind::Berserk, 1, source, duration))
            {
                out.push((MsgChannel::Status, format!("{} goes berserk!", capitalise(&the_name(&*m)))));
                effects.push(HitEffect::Frenzied);
            }
        }
        _ => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn flavour_effects(
    session: &mut GameSession,
    attacker: Mid,
    defender: Mid,
    snap: &AttackSnapshot,
    source: EffectSource,
    damage_done: i32,
    out: &mut Vec<Line>,
    effects: &mut Vec<HitEffect>,
) {
    let level = snap.level.max(1);
    let rng = &mut session.rng;
    let (status, effect): (Option<&str>, HitEffect) = match snap.flavour {
        AttackFlavour::Poison => {
            let amount = 1 + rng.random2(level);
            let took = session
                .world
                .actor_mut(defender)
                .is_some_and(|d| d.poison(source, amount));
            if !took {
                return;
            }
            (Some("poisoned"), HitEffect::Poisoned)
        }
        AttackFlavour::Paralyse => {
            if rng.one_chance_in(3) {
                return;
            }
            let duration = (1 + rng.random2(3)) * BASELINE_DELAY;
            let took = session
                .world
                .actor_mut(defender)
                .is_some_and(|d| d.paralyse(source, duration));
            if !took {
                return;
            }
            (Some("paralysed"), HitEffect::Paralysed)
        }
        AttackFlavour::Confuse => {
            if !rng.x_chance_in_y(2, 3) {
                return;
            }
            let duration = (3 + rng.random2(level)) * BASELINE_DELAY;
            let took = session
                .world
                .actor_mut(defender)
                .is_some_and(|d| d.confuse(source, duration));
            if !took {
                return;
            }
            (Some("confused"), HitEffect::Confused)
        }
        AttackFlavour::Slow => {
            let duration = (5 + rng.random2(level)) * BASELINE_DELAY;
            let took = session
                .world
                .actor_mut(defender)
                .is_some_and(|d| d.slow_down(source, duration));
            if !took {
                return;
            }
            (Some("slowed"), HitEffect::Slowed)
        }
        AttackFlavour::Drain => {
            if !rng.one_chance_in(3) {
                return;
            }
            let took = session
                .world
                .actor_mut(defender)
                .is_some_and(|d| d.is_living() && d.drain(source, 1));
            if !took {
                return;
            }
            (Some("drained"), HitEffect::Drained)
        }
        AttackFlavour::Corrode => {
            let duration = (5 + rng.random2(5)) * BASELINE_DELAY;
            let took = session
                .world
                .actor_mut(defender)
                .is_some_and(|d| d.corrode(source, duration));
            if !took {
                return;
            }
            (Some("corroded"), HitEffect::Corroded)
        }
        AttackFlavour::Weakness => {
            let duration = (4 + rng.random2(4)) * BASELINE_DELAY;
            let took = session
                .world
                .actor_mut(defender)
                .is_some_and(|d| d.weaken(source, duration));
            if !took {
                return;
            }
            (Some("weakened"), HitEffect::Weakened)
        }
        AttackFlavour::Vampiric => {
            let healed = drink(session, attacker, defender, damage_done);
            if healed == 0 {
                return;
            }
            (None, HitEffect::AttackerHealed(healed))
        }
        AttackFlavour::Constrict | AttackFlavour::Entangle => {
            let ctype = if snap.flavour == AttackFlavour::Constrict {
                ConstrictType::Melee
            } else {
                ConstrictType::Entangle
            };
            if !constrict::can_constrict(session, attacker, defender, ctype)
                || constrict::start_constricting(session, attacker, defender, ctype, None).is_err()
            {
                return;
            }
            (None, HitEffect::Constricted)
        }
        _ => return,
    };
    if let (Some(what), Some(d)) = (status, session.world.actor(defender)) {
        out.push((MsgChannel::Status, affected(&**d, what)));
    }
    effects.push(effect);
}
