//! Passive auras
//!
//! Some monsters project a status onto everything suitable around them. An
//! aura is never cast: the source re-evaluates it every tick, granting or
//! topping up the effect on actors that qualify and taking it back from
//! actors that no longer do. A top-up resets the timer to the aura's base
//! duration; it never adds to it.

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, trace};

use crate::actor::{Actor, Creature, EffectSource, Mid, MonsterType, PlayerDuration, mons_aligned};
use crate::consts::BASELINE_DELAY;
use crate::enchant::{self, AuraPolarity, EnchantKind, MonEnchant};
use crate::error::{CombatError, CombatResult};
use crate::message::MsgChannel;
use crate::session::GameSession;
use crate::world::cell_see_cell_no_trans;

/// Which side of the source an aura works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum AuraTargets {
    Allies,
    Enemies,
}

/// Static description of one monster type's aura.
#[derive(Debug, Clone, Copy)]
pub struct AuraDescriptor {
    pub source: MonsterType,
    pub ench: EnchantKind,
    pub base_duration: i32,
    /// Status given to the player instead of `ench`
    pub player_duration: Option<PlayerDuration>,
    pub targets: AuraTargets,
    pub affects_firewood: bool,
    pub adjacent_only: bool,
    /// Extra test a candidate must pass
    pub predicate: Option<fn(&Creature) -> bool>,
    /// Shown the first time the player is caught
    pub player_message: Option<&'static str>,
}

impl AuraDescriptor {
    pub fn polarity(&self) -> AuraPolarity {
        match self.targets {
            AuraTargets::Allies => AuraPolarity::Friendly,
            AuraTargets::Enemies => AuraPolarity::Hostile,
        }
    }

    pub fn is_hostile(&self) -> bool {
        self.targets == AuraTargets::Enemies
    }
}

fn corrodible(c: &Creature) -> bool {
    c.res_acid() < 3
}

static AURAS: [AuraDescriptor; 3] = [
    AuraDescriptor {
        source: MonsterType::TorporSnail,
        ench: EnchantKind::Slow,
        base_duration: 2 * BASELINE_DELAY,
        player_duration: Some(PlayerDuration::Slow),
        targets: AuraTargets::Enemies,
        affects_firewood: false,
        adjacent_only: false,
        predicate: None,
        player_message: Some("Your limbs feel heavy."),
    },
    AuraDescriptor {
        source: MonsterType::Cherub,
        ench: EnchantKind::Resistance,
        base_duration: 2 * BASELINE_DELAY,
        player_duration: Some(PlayerDuration::Resistance),
        targets: AuraTargets::Allies,
        affects_firewood: false,
        adjacent_only: false,
        predicate: None,
        player_message: Some("You feel protected from the elements."),
    },
    AuraDescriptor {
        source: MonsterType::EntropyWeaver,
        ench: EnchantKind::Corrosion,
        base_duration: 3 * BASELINE_DELAY,
        player_duration: Some(PlayerDuration::Corrosion),
        targets: AuraTargets::Enemies,
        affects_firewood: true,
        adjacent_only: true,
        predicate: Some(corrodible),
        player_message: Some("Acid eats at your armour!"),
    },
];

/// The aura a monster type projects, if any.
pub fn aura_for(mtype: MonsterType) -> Option<&'static AuraDescriptor> {
    AURAS.iter().find(|a| a.source == mtype)
}

/// What one aura tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraTick {
    /// Source stood in a sanctuary and did nothing
    pub suppressed: bool,
    /// Granted for the first time or topped up to the base duration
    pub applied: Vec<Mid>,
    /// Already held as much or more
    pub unchanged: Vec<Mid>,
    /// Lost the effect because they stopped qualifying
    pub removed: Vec<Mid>,
}

fn qualifies(session: &GameSession, aura: &AuraDescriptor, source: &Creature, candidate: &Creature) -> bool {
    if candidate.mid() == source.mid() || !candidate.alive() {
        return false;
    }
    if aura.adjacent_only && !source.pos().adjacent(candidate.pos()) {
        return false;
    }
    if !cell_see_cell_no_trans(&session.world, source.pos(), candidate.pos(), session.config.los_radius) {
        return false;
    }
    let aligned = mons_aligned(source.attitude(), candidate.attitude());
    let side_ok = match aura.targets {
        AuraTargets::Allies => aligned,
        AuraTargets::Enemies => !aligned,
    };
    if !side_ok {
        return false;
    }
    if candidate.is_firewood() && !aura.affects_firewood {
        return false;
    }
    aura.predicate.is_none_or(|p| p(candidate))
}

/// Whether `mid` holds an effect granted by this aura of `source`.
fn holds_from(session: &GameSession, aura: &AuraDescriptor, source: Mid, mid: Mid) -> bool {
    session
        .world
        .monster(mid)
        .and_then(|m| m.get_ench(aura.ench))
        .is_some_and(|e| e.aura == Some(aura.polarity()) && e.source == source)
}

/// Re-evaluate the aura of `source` for one tick.
///
/// Monsters without an aura are a no-op. Hostile auras are suppressed while
/// the source stands in a sanctuary.
pub fn mons_update_aura(session: &mut GameSession, source: Mid) -> CombatResult<AuraTick> {
    let src = session.world.actor(source).ok_or(CombatError::ActorNotFound(source))?;
    let m = src.as_monster().ok_or(CombatError::NotAMonster(source))?;
    if !src.alive() || session.is_dead(source) {
        return Err(CombatError::ActorDead(source));
    }
    let mut tick = AuraTick::default();
    let Some(aura) = aura_for(m.mtype) else {
        return Ok(tick);
    };
    if aura.is_hostile()
        && session.config.sanctuary_suppresses_hostile_auras
        && session.world.is_sanctuary(src.pos())
    {
        trace!(%source, "aura suppressed by sanctuary");
        tick.suppressed = true;
        return Ok(tick);
    }

    let effect_source = EffectSource::of(&**src);
    let mut grant = Vec::new();
    let mut revoke = Vec::new();
    let mut player_qualifies = None;
    for mid in session.world.mids() {
        let Some(candidate) = session.world.actor(mid) else {
            continue;
        };
        let ok = qualifies(session, aura, src, candidate);
        if candidate.is_player() {
            player_qualifies = Some(ok);
        } else if ok {
            grant.push(mid);
        } else if holds_from(session, aura, source, mid) {
            revoke.push(mid);
        }
    }

    for mid in grant {
        let Some(target) = session.world.monster_mut(mid) else {
            continue;
        };
        let current = target.get_ench(aura.ench).map_or(0, |e| e.duration);
        if current >= aura.base_duration {
            tick.unchanged.push(mid);
            continue;
        }
        // replace rather than merge, so the timer is exactly the base
        target.enchantments.remove(aura.ench);
        let ench = MonEnchant::new(aura.ench, 1, effect_source, aura.base_duration).with_aura(aura.polarity());
        if target.add_ench(ench) {
            tick.applied.push(mid);
        }
    }

    for mid in revoke {
        if enchant::del_ench(session, mid, aura.ench, false)? {
            tick.removed.push(mid);
        }
    }

    if let Some(ok) = player_qualifies {
        update_player(session, aura, source, ok, &mut tick);
    }

    debug!(
        %source,
        applied = tick.applied.len(),
        unchanged = tick.unchanged.len(),
        removed = tick.removed.len(),
        "aura updated"
    );
    Ok(tick)
}

fn update_player(session: &mut GameSession, aura: &AuraDescriptor, source: Mid, qualifies: bool, tick: &mut AuraTick) {
    let Some(duration) = aura.player_duration else {
        return;
    };
    let Some(player) = session.world.player_mut() else {
        return;
    };
    if !qualifies {
        if player.aura_source(duration) == Some(source) && player.revoke_aura_duration(duration) {
            tick.removed.push(Mid::PLAYER);
        }
        return;
    }
    let current = player.duration(duration);
    if current >= aura.base_duration {
        tick.unchanged.push(Mid::PLAYER);
        return;
    }
    player.grant_aura_duration(duration, aura.base_duration, source);
    tick.applied.push(Mid::PLAYER);
    if current == 0
        && let Some(text) = aura.player_message
    {
        session.say(MsgChannel::Warning, text);
    }
}
