//! Ugly things
//!
//! An ugly thing's colour decides its attack flavour and the matching
//! resistance. Ugly things recolour when mutagenic energy from nearby kin
//! gets to them, and can be upgraded into very ugly things.

use tracing::debug;

use super::{GhostDemon, GhostKind, MonColour};
use crate::actor::{Actor, Mid, MonsterType};
use crate::combat::{AttackFlavour, MonAttackKind};
use crate::config::CombatConfig;
use crate::error::{CombatError, CombatResult};
use crate::message::MsgChannel;
use crate::resist::{MonResists, ResistChannel};
use crate::rng::GameRng;
use crate::session::GameSession;

/// Colours an ugly thing can come in.
pub const UGLY_THING_COLOURS: [MonColour; 6] = [
    MonColour::Red,
    MonColour::Brown,
    MonColour::Green,
    MonColour::Cyan,
    MonColour::Magenta,
    MonColour::LightGrey,
];

/// Attack flavour of an ugly thing of this colour.
pub fn ugly_thing_colour_to_flavour(colour: MonColour) -> Option<AttackFlavour> {
    match colour {
        MonColour::Red => Some(AttackFlavour::Fire),
        MonColour::Brown => Some(AttackFlavour::Corrode),
        MonColour::Green => Some(AttackFlavour::Poison),
        MonColour::Cyan => Some(AttackFlavour::Elec),
        MonColour::Magenta => Some(AttackFlavour::Weakness),
        MonColour::LightGrey => Some(AttackFlavour::Confuse),
        _ => None,
    }
}

fn ugly_thing_resists(very_ugly: bool, flavour: AttackFlavour) -> MonResists {
    let level = if very_ugly { 2 } else { 1 };
    let channel = match flavour {
        AttackFlavour::Fire => ResistChannel::Fire,
        AttackFlavour::Corrode => return MonResists::single(ResistChannel::Acid, 3),
        AttackFlavour::Poison => ResistChannel::Poison,
        AttackFlavour::Elec => ResistChannel::Elec,
        _ => return MonResists::NONE,
    };
    MonResists::single(channel, level)
}

/// Hit points for `hd` hit dice of `base + random2(spread)` each.
fn hit_points(rng: &mut GameRng, hd: i32, base: i32, spread: i32) -> i32 {
    (0..hd).map(|_| base + rng.random2(spread)).sum()
}

fn random_colour(rng: &mut GameRng, except: Option<MonColour>) -> MonColour {
    let pool: Vec<MonColour> = UGLY_THING_COLOURS
        .iter()
        .copied()
        .filter(|c| Some(*c) != except)
        .collect();
    rng.choose(&pool).copied().unwrap_or(MonColour::Red)
}

fn set_colour(g: &mut GhostDemon, colour: MonColour) {
    g.colour = colour;
    g.att_flav = ugly_thing_colour_to_flavour(colour).unwrap_or(AttackFlavour::Plain);
    g.resists = ugly_thing_resists(g.kind == GhostKind::VeryUglyThing, g.att_flav);
}

/// Roll a fresh ugly thing. `colour` must be an ugly-thing colour to be used.
pub fn init_ugly_thing(
    rng: &mut GameRng,
    very_ugly: bool,
    colour: Option<MonColour>,
    config: &CombatConfig,
) -> GhostDemon {
    let mut g = GhostDemon::new(GhostKind::UglyThing, "ugly thing");
    g.speed = 9 + rng.random2(3);
    g.ev = 9 + rng.random2(3);
    g.ac = 2 + rng.random2(3);
    g.damage = 11 + rng.random2(3);
    g.xl = 8;
    g.max_hp = hit_points(rng, 8, 3, 5);
    g.att_type = MonAttackKind::Hit;

    let colour = colour
        .filter(|c| UGLY_THING_COLOURS.contains(c))
        .unwrap_or_else(|| random_colour(rng, None));
    set_colour(&mut g, colour);

    if very_ugly {
        upgrade_profile(rng, &mut g);
    }
    g.clamp_to_caps(config);
    g
}

fn upgrade_profile(rng: &mut GameRng, g: &mut GhostDemon) {
    g.kind = GhostKind::VeryUglyThing;
    g.name = "very ugly thing".to_string();
    g.ac += 1;
    g.damage += 5;
    g.xl += 4;
    g.max_hp += hit_points(rng, 4, 3, 5);
    g.att_type = MonAttackKind::Bite;
    let colour = g.colour;
    set_colour(g, colour);
}

fn is_ugly(mtype: MonsterType) -> bool {
    matches!(mtype, MonsterType::UglyThing | MonsterType::VeryUglyThing)
}

/// Recolour an ugly thing.
///
/// With `proximity` the change only happens if mutagenic energy from
/// adjacent ugly things gets through; a neighbour of a different colour may
/// pass its colour on. Without it the change always happens. Returns
/// whether the monster changed.
pub fn ugly_thing_mutate(session: &mut GameSession, mid: Mid, proximity: bool) -> CombatResult<bool> {
    let (pos, colour) = {
        let mon = session
            .world
            .monster(mid)
            .ok_or(CombatError::ActorNotFound(mid))?;
        match mon.ghost.as_deref() {
            Some(g) if g.kind.is_ugly_thing() => (mon.pos, g.colour),
            _ => return Err(CombatError::NotUglyThing(mid)),
        }
    };

    let mut forced = None;
    let mut success = !proximity;
    if proximity && session.rng.one_chance_in(8) {
        let mut chance = 0;
        for other in session.world.monster_mids() {
            let Some(near) = session.world.monster(other) else {
                continue;
            };
            if other == mid || !is_ugly(near.mtype) || !near.pos.adjacent(pos) || !near.alive() {
                continue;
            }
            let near_colour = near.ghost.as_deref().map_or(colour, |g| g.colour);
            let rolls = if near.mtype == MonsterType::VeryUglyThing { 2 } else { 1 };
            for _ in 0..rolls {
                if session.rng.coinflip() {
                    chance += 1;
                    if session.rng.coinflip() && near_colour != colour {
                        forced = Some(near_colour);
                    }
                }
            }
        }
        let chance = chance.min(16);
        success = !session.rng.one_chance_in(chance + 1);
    }
    if !success {
        return Ok(false);
    }

    let new_colour = forced.unwrap_or_else(|| random_colour(&mut session.rng, Some(colour)));
    let name = {
        let mon = session
            .world
            .monster_mut(mid)
            .ok_or(CombatError::ActorNotFound(mid))?;
        if let Some(g) = mon.ghost.as_deref_mut() {
            set_colour(g, new_colour);
        }
        mon.sync_ghost();
        mon.name.clone()
    };
    debug!(%mid, from = %colour, to = %new_colour, proximity, "ugly thing mutated");
    let src = if proximity { " from its kin" } else { "" };
    session.say(
        MsgChannel::Status,
        format!("The {name} basks in the mutagenic energy{src} and changes!"),
    );
    Ok(true)
}

/// Turn an ugly thing into a very ugly thing. Returns false if it already
/// is one.
pub fn ugly_thing_upgrade(session: &mut GameSession, mid: Mid) -> CombatResult<bool> {
    let mon = session
        .world
        .monster_mut(mid)
        .ok_or(CombatError::ActorNotFound(mid))?;
    let Some(g) = mon.ghost.as_deref_mut().filter(|g| g.kind.is_ugly_thing()) else {
        return Err(CombatError::NotUglyThing(mid));
    };
    if g.kind == GhostKind::VeryUglyThing {
        return Ok(false);
    }
    upgrade_profile(&mut session.rng, g);
    g.clamp_to_caps(&session.config);
    mon.sync_ghost();
    debug!(%mid, hp = mon.hp, "ugly thing upgraded");
    Ok(true)
}
