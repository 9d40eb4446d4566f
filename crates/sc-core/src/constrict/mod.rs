//! Constriction: one actor holding others in place
//!
//! A link is stored on both ends: the constrictor lists its victims and each
//! victim names its constrictor. Every function here changes both ends
//! together, so `A` lists `B` exactly when `B` is held by `A`.
//!
//! Links refer to actors by [`Mid`]. A link whose other end has gone away is
//! not an error; [`has_invalid_constrictor`] spots it and
//! [`clear_invalid_constrictions`] tears it down.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::{debug, trace, warn};

use crate::actor::{Actor, Mid};
use crate::combat::{AcRule, apply_ac};
use crate::error::{CombatError, CombatResult};
use crate::message::{MsgChannel, capitalise, possessive, the_name};
use crate::session::{DeathCause, GameSession, Responsible};
use crate::world::{World, cell_see_cell_no_trans};

/// How a hold is maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum ConstrictType {
    /// Body coils; needs adjacency
    Melee,
    /// Grasping weapon or vines; works up to the holder's reach
    Entangle,
    /// Roots from the ground; needs sight and the victim standing still
    Roots,
    /// Zombie hands from the ground; same rules as roots
    Bvc,
}

impl ConstrictType {
    /// Whether the constrictor itself holds on, as opposed to something it
    /// conjured out of the floor.
    pub fn is_direct(self) -> bool {
        matches!(self, ConstrictType::Melee | ConstrictType::Entangle)
    }
}

/// Constriction bookkeeping carried by every actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstrictionState {
    /// Who holds this actor
    pub constricted_by: Option<Mid>,
    /// How this actor is held
    pub ctype: Option<ConstrictType>,
    /// Failed struggles against the current hold
    pub escape_attempts: i32,
    /// Who this actor holds; `None` when nobody
    pub constricting: Option<Vec<Mid>>,
}

impl ConstrictionState {
    pub fn is_constricted(&self) -> bool {
        self.constricted_by.is_some()
    }

    pub fn is_constricting(&self) -> bool {
        self.constricting.as_ref().is_some_and(|v| !v.is_empty())
    }

    pub fn is_constricting_mid(&self, victim: Mid) -> bool {
        self.victims().contains(&victim)
    }

    pub fn num_constricting(&self) -> usize {
        self.victims().len()
    }

    pub fn victims(&self) -> &[Mid] {
        self.constricting.as_deref().unwrap_or(&[])
    }

    /// Forget the victim side of a link. Resets the escape counter.
    pub fn clear_constricted(&mut self) {
        self.constricted_by = None;
        self.ctype = None;
        self.escape_attempts = 0;
    }

    /// Forget one victim. Returns whether it was listed.
    pub fn remove_victim(&mut self, victim: Mid) -> bool {
        let Some(list) = self.constricting.as_mut() else {
            return false;
        };
        let before = list.len();
        list.retain(|&m| m != victim);
        let removed = list.len() != before;
        if list.is_empty() {
            self.constricting = None;
        }
        removed
    }

    fn add_victim(&mut self, victim: Mid) {
        let list = self.constricting.get_or_insert_with(Vec::new);
        if !list.contains(&victim) {
            list.push(victim);
        }
    }
}

fn link(world: &mut World, constrictor: Mid, victim: Mid, ctype: ConstrictType, duration: Option<i32>) {
    if let Some(v) = world.actor_mut(victim) {
        let state = v.constriction_mut();
        state.constricted_by = Some(constrictor);
        state.ctype = Some(ctype);
        state.escape_attempts = 0;
        if duration.is_some() {
            v.set_constricted_status(duration);
        }
    }
    if let Some(c) = world.actor_mut(constrictor) {
        c.constriction_mut().add_victim(victim);
    }
}

/// Sever one link on both ends. Returns whether anything changed.
fn unlink(world: &mut World, constrictor: Mid, victim: Mid) -> bool {
    let mut changed = false;
    if let Some(v) = world.actor_mut(victim)
        && v.constriction().constricted_by == Some(constrictor)
    {
        v.constriction_mut().clear_constricted();
        v.set_constricted_status(None);
        changed = true;
    }
    if let Some(c) = world.actor_mut(constrictor) {
        changed |= c.constriction_mut().remove_victim(victim);
    }
    changed
}

/// Sever every link that touches `mid`, in either direction.
///
/// Also sweeps the rest of the world for stray back-references, so the
/// actor can be removed without leaving a half link behind.
pub fn detach_all(world: &mut World, mid: Mid) {
    let (held_by, victims) = match world.actor(mid) {
        Some(a) => (
            a.constriction().constricted_by,
            a.constriction().victims().to_vec(),
        ),
        None => (None, Vec::new()),
    };
    if let Some(c) = held_by {
        unlink(world, c, mid);
    }
    for v in victims {
        unlink(world, mid, v);
    }
    for other in world.mids() {
        let Some(a) = world.actor(other) else {
            continue;
        };
        let stale_victim = a.constriction().constricted_by == Some(mid);
        let stale_holder = a.constriction().is_constricting_mid(mid);
        if stale_victim {
            unlink(world, mid, other);
        }
        if stale_holder {
            unlink(world, other, mid);
        }
    }
}

/// Whether every link in the world is recorded on both ends.
pub fn links_consistent(world: &World) -> bool {
    world.mids().into_iter().all(|mid| {
        let Some(a) = world.actor(mid) else {
            return true;
        };
        let victims_ok = a.constriction().victims().iter().all(|&v| {
            world
                .actor(v)
                .is_some_and(|victim| victim.constriction().constricted_by == Some(mid))
        });
        let holder_ok = match a.constriction().constricted_by {
            Some(c) => world
                .actor(c)
                .is_some_and(|holder| holder.constriction().is_constricting_mid(mid)),
            None => true,
        };
        victims_ok && holder_ok
    })
}

/// How many victims `actor` can hold at once in the given way.
fn hold_capacity(actor: &crate::actor::Creature, ctype: ConstrictType) -> usize {
    if !ctype.is_direct() {
        return usize::MAX;
    }
    match actor.as_monster() {
        Some(m) if ctype == ConstrictType::Melee => m
            .attacks
            .iter()
            .filter(|a| a.flavour == crate::combat::AttackFlavour::Constrict)
            .count()
            .max(1),
        _ => 1,
    }
}

fn in_hold_range(session: &GameSession, constrictor: &dyn Actor, victim: &dyn Actor, ctype: ConstrictType) -> bool {
    let dist = constrictor.pos().distance(victim.pos());
    match ctype {
        ConstrictType::Melee => dist <= 1,
        ConstrictType::Entangle => dist <= constrictor.reach_range(),
        ConstrictType::Roots | ConstrictType::Bvc => {
            cell_see_cell_no_trans(
                &session.world,
                constrictor.pos(),
                victim.pos(),
                session.config.los_radius,
            ) && session.world.terrain(victim.pos()).is_solid_floor()
        }
    }
}

/// Whether `constrictor` could start holding `victim` right now.
pub fn can_constrict(session: &GameSession, constrictor: Mid, victim: Mid, ctype: ConstrictType) -> bool {
    if constrictor == victim {
        return false;
    }
    let (Some(c), Some(v)) = (session.world.actor(constrictor), session.world.actor(victim)) else {
        return false;
    };
    if !c.alive() || !v.alive() || session.is_dead(constrictor) || session.is_dead(victim) {
        return false;
    }
    if v.constriction().is_constricted() || c.constriction().constricted_by == Some(victim) {
        return false;
    }
    if v.res_constrict() > 0 {
        return false;
    }
    if ctype.is_direct() {
        if c.incapacitated() {
            return false;
        }
        if c.constriction().num_constricting() >= hold_capacity(c, ctype) {
            return false;
        }
    }
    in_hold_range(session, &**c, &**v, ctype)
}

/// Start a hold.
///
/// `duration` gives the hold a timed status on the victim; without one the
/// hold lasts until released or escaped. Nothing changes on error.
pub fn start_constricting(
    session: &mut GameSession,
    constrictor: Mid,
    victim: Mid,
    ctype: ConstrictType,
    duration: Option<i32>,
) -> CombatResult<()> {
    if constrictor == victim {
        return Err(CombatError::SelfConstriction(constrictor));
    }
    for mid in [constrictor, victim] {
        let actor = session.world.actor(mid).ok_or(CombatError::ActorNotFound(mid))?;
        if !actor.alive() || session.is_dead(mid) {
            return Err(CombatError::ActorDead(mid));
        }
    }
    let (c, v) = match (session.world.actor(constrictor), session.world.actor(victim)) {
        (Some(c), Some(v)) => (c, v),
        _ => return Err(CombatError::ActorNotFound(victim)),
    };
    if let Some(by) = v.constriction().constricted_by {
        return Err(CombatError::AlreadyConstricted { victim, by });
    }
    if c.constriction().constricted_by == Some(victim) {
        return Err(CombatError::MutualConstriction {
            constrictor,
            victim,
        });
    }
    if !can_constrict(session, constrictor, victim, ctype) {
        return Err(CombatError::CannotConstrict {
            constrictor,
            victim,
        });
    }

    let text = match ctype {
        ConstrictType::Melee => format!("{} grabs {}.", capitalise(&the_name(&**c)), the_name(&**v)),
        ConstrictType::Entangle => format!(
            "{} entangles {}.",
            capitalise(&the_name(&**c)),
            the_name(&**v)
        ),
        ConstrictType::Roots => format!("Roots grab {}.", the_name(&**v)),
        ConstrictType::Bvc => format!("Zombie hands grab {}.", the_name(&**v)),
    };
    link(&mut session.world, constrictor, victim, ctype, duration);
    debug!(%constrictor, %victim, %ctype, ?duration, "constriction started");
    session.say(MsgChannel::Combat, text);
    Ok(())
}

/// Release one victim. Returns false if there was no such link.
pub fn stop_constricting(session: &mut GameSession, constrictor: Mid, victim: Mid, quiet: bool) -> bool {
    let text = match (session.world.actor(constrictor), session.world.actor(victim)) {
        (Some(c), Some(v)) => Some(format!(
            "{} {} released from {} grip.",
            capitalise(&the_name(&**v)),
            if v.is_player() { "are" } else { "is" },
            possessive(&**c)
        )),
        _ => None,
    };
    if !unlink(&mut session.world, constrictor, victim) {
        return false;
    }
    debug!(%constrictor, %victim, "constriction ended");
    if !quiet && let Some(text) = text {
        session.say(MsgChannel::Combat, text);
    }
    true
}

/// Release every victim of `constrictor`.
pub fn stop_constricting_all(session: &mut GameSession, constrictor: Mid, quiet: bool) {
    let victims = victims_of(&session.world, constrictor);
    for v in victims {
        stop_constricting(session, constrictor, v, quiet);
    }
}

/// Release only the victims `constrictor` holds itself. Roots and hands it
/// conjured keep their grip.
pub fn stop_directly_constricting_all(session: &mut GameSession, constrictor: Mid, quiet: bool) {
    let victims = victims_of(&session.world, constrictor);
    for v in victims {
        let direct = session
            .world
            .actor(v)
            .and_then(|a| a.constriction().ctype)
            .is_none_or(ConstrictType::is_direct);
        if direct {
            stop_constricting(session, constrictor, v, quiet);
        }
    }
}

/// Free `victim` from whatever holds it.
pub fn stop_being_constricted(session: &mut GameSession, victim: Mid, quiet: bool) -> bool {
    let Some(by) = session
        .world
        .actor(victim)
        .and_then(|a| a.constriction().constricted_by)
    else {
        return false;
    };
    if session.world.contains(by) {
        stop_constricting(session, by, victim, quiet)
    } else {
        // holder is gone; only our end is left
        warn!(%victim, holder = %by, "clearing hold by missing constrictor");
        if let Some(v) = session.world.actor_mut(victim) {
            v.constriction_mut().clear_constricted();
            v.set_constricted_status(None);
        }
        true
    }
}

fn victims_of(world: &World, constrictor: Mid) -> Vec<Mid> {
    world
        .actor(constrictor)
        .map(|a| a.constriction().victims().to_vec())
        .unwrap_or_default()
}

/// Whether the hold on `victim` should no longer stand.
///
/// `moved` says the victim has just changed position, which breaks holds
/// from the ground.
pub fn has_invalid_constrictor(session: &GameSession, victim: Mid, moved: bool) -> bool {
    let Some(v) = session.world.actor(victim) else {
        return false;
    };
    let Some(by) = v.constriction().constricted_by else {
        return false;
    };
    let Some(c) = session.world.actor(by) else {
        return true;
    };
    if !c.alive() || session.is_dead(by) || !c.constriction().is_constricting_mid(victim) {
        return true;
    }
    let ctype = v.constriction().ctype.unwrap_or(ConstrictType::Melee);
    match ctype {
        ConstrictType::Melee | ConstrictType::Entangle => {
            !in_hold_range(session, &**c, &**v, ctype)
        }
        ConstrictType::Roots | ConstrictType::Bvc => {
            moved || !in_hold_range(session, &**c, &**v, ctype)
        }
    }
}

/// Drop every link touching `mid` that no longer stands, on either side.
pub fn clear_invalid_constrictions(session: &mut GameSession, mid: Mid, moved: bool) {
    if has_invalid_constrictor(session, mid, moved) {
        stop_being_constricted(session, mid, false);
    }

    for v in victims_of(&session.world, mid) {
        let points_back = session
            .world
            .actor(v)
            .is_some_and(|a| a.alive() && a.constriction().constricted_by == Some(mid));
        if !points_back {
            warn!(constrictor = %mid, victim = %v, "dropping stale victim");
            unlink(&mut session.world, mid, v);
        } else if has_invalid_constrictor(session, v, false) {
            stop_constricting(session, mid, v, false);
        }
    }
}

/// Per-turn work for a constrictor: validate its holds, squeeze each victim
/// and validate again.
///
/// A constrictor standing in a sanctuary lets everyone go instead.
pub fn handle_constriction(session: &mut GameSession, constrictor: Mid) -> CombatResult<()> {
    let actor = session
        .world
        .actor(constrictor)
        .ok_or(CombatError::ActorNotFound(constrictor))?;
    if !actor.alive() || session.is_dead(constrictor) {
        return Err(CombatError::ActorDead(constrictor));
    }
    if session.world.is_sanctuary(actor.pos()) {
        stop_constricting_all(session, constrictor, false);
        return Ok(());
    }

    clear_invalid_constrictions(session, constrictor, false);

    for v in victims_of(&session.world, constrictor) {
        let Some(c) = session.world.actor(constrictor) else {
            break;
        };
        let Some(victim) = session.world.actor(v) else {
            continue;
        };
        if victim.constriction().constricted_by != Some(constrictor) {
            continue;
        }
        let ctype = victim.constriction().ctype.unwrap_or(ConstrictType::Melee);
        let base = c.constriction_damage(ctype);
        let (ac, gdr) = (victim.armour_class(), victim.gdr_percent());
        let victim_name = the_name(&**victim);
        let holder_name = the_name(&**c);

        let raw = session.rng.roll_dice(1, base);
        let damage = apply_ac(&mut session.rng, raw, ac, gdr, AcRule::Half);
        trace!(%constrictor, victim = %v, raw, damage, ac, "constriction damage");

        let alive = match session.world.actor_mut(v) {
            Some(victim) => {
                victim.hurt(damage);
                victim.alive()
            }
            None => continue,
        };
        let text = if damage > 0 {
            format!("{} constricts {}.", capitalise(&holder_name), victim_name)
        } else {
            format!(
                "{} constricts {}, but does no damage.",
                capitalise(&holder_name),
                victim_name
            )
        };
        session.say(MsgChannel::Combat, text);
        if !alive {
            session.monster_die(v, DeathCause::Constriction, Responsible::from(constrictor));
        }
    }

    if session.world.contains(constrictor) {
        clear_invalid_constrictions(session, constrictor, false);
    }
    Ok(())
}

/// One struggle by `victim` against its hold. Returns whether it got free.
///
/// A hold that turns out to be stale frees the victim without a roll.
pub fn attempt_escape(session: &mut GameSession, victim: Mid) -> CombatResult<bool> {
    let v = session
        .world
        .actor(victim)
        .ok_or(CombatError::ActorNotFound(victim))?;
    let by = v
        .constriction()
        .constricted_by
        .ok_or(CombatError::NotConstricted(victim))?;
    if has_invalid_constrictor(session, victim, false) {
        stop_being_constricted(session, victim, true);
        return Ok(true);
    }

    let ctype = v.constriction().ctype.unwrap_or(ConstrictType::Melee);
    let rule = session.config.escape_rule(ctype);
    let escape_power = v.escape_power();
    let hold = session.world.actor(by).map_or(1, |c| c.hold_strength()).max(1);
    let attempts = match session.world.actor_mut(victim) {
        Some(v) => {
            let state = v.constriction_mut();
            state.escape_attempts += 1;
            state.escape_attempts
        }
        None => return Err(CombatError::ActorNotFound(victim)),
    };

    let attfactor = escape_power * rule.trend.factor(attempts);
    let randfact =
        rule.hold_bonus + session.rng.roll_dice(1, rule.hold_die) + session.rng.roll_dice(1, hold);
    debug!(%victim, holder = %by, attempts, attfactor, randfact, trend = %rule.trend, "escape roll");

    if attfactor > randfact {
        let text = session.world.actor(victim).map(|v| {
            format!(
                "{} {} free.",
                capitalise(&the_name(&**v)),
                if v.is_player() { "break" } else { "breaks" }
            )
        });
        stop_constricting(session, by, victim, true);
        if let Some(text) = text {
            session.say(MsgChannel::Combat, text);
        }
        Ok(true)
    } else {
        let text = session.world.actor(victim).map(|v| {
            format!(
                "{} {} to escape.",
                capitalise(&the_name(&**v)),
                if v.is_player() { "struggle" } else { "struggles" }
            )
        });
        if let Some(text) = text {
            session.say(MsgChannel::Combat, text);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Monster, MonsterType, Player};
    use crate::config::EscapeTrend;
    use crate::enchant::EnchantKind;
    use crate::rng::GameRng;
    use crate::world::{Coord, Terrain};

    fn session_with_pair() -> (GameSession, Mid, Mid) {
        let mut session = GameSession::new(7);
        let naga = session.world.add_monster(
            Monster::new(MonsterType::Naga, "naga")
                .with_hp(30)
                .at(Coord::new(0, 0)),
        );
        let rat = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "rat").with_hp(20).at(Coord::new(1, 0)));
        (session, naga, rat)
    }

    fn holder_of(session: &GameSession, mid: Mid) -> Option<Mid> {
        session.world.actor(mid).and_then(|a| a.constriction().constricted_by)
    }

    #[test]
    fn test_start_links_both_ends() {
        let (mut session, naga, rat) = session_with_pair();
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        assert_eq!(holder_of(&session, rat), Some(naga));
        let naga_state = session.world.actor(naga).unwrap().constriction().clone();
        assert!(naga_state.is_constricting_mid(rat));
        assert_eq!(naga_state.num_constricting(), 1);
        assert!(links_consistent(&session.world));
    }

    #[test]
    fn test_start_rejects_bad_requests_without_mutation() {
        let (mut session, naga, rat) = session_with_pair();
        assert_eq!(
            start_constricting(&mut session, naga, naga, ConstrictType::Melee, None),
            Err(CombatError::SelfConstriction(naga))
        );
        assert_eq!(
            start_constricting(&mut session, naga, Mid(99), ConstrictType::Melee, None),
            Err(CombatError::ActorNotFound(Mid(99)))
        );
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        assert_eq!(
            start_constricting(&mut session, naga, rat, ConstrictType::Melee, None),
            Err(CombatError::AlreadyConstricted { victim: rat, by: naga })
        );
        assert_eq!(
            start_constricting(&mut session, rat, naga, ConstrictType::Melee, None),
            Err(CombatError::MutualConstriction {
                constrictor: rat,
                victim: naga
            })
        );
        assert!(links_consistent(&session.world));
        assert_eq!(session.world.actor(naga).unwrap().constriction().num_constricting(), 1);
    }

    #[test]
    fn test_out_of_reach_cannot_constrict() {
        let (mut session, naga, rat) = session_with_pair();
        session.world.actor_mut(rat).unwrap().set_pos(Coord::new(3, 0));
        assert!(!can_constrict(&session, naga, rat, ConstrictType::Melee));
        assert!(matches!(
            start_constricting(&mut session, naga, rat, ConstrictType::Melee, None),
            Err(CombatError::CannotConstrict { .. })
        ));
        assert!(can_constrict(&session, naga, rat, ConstrictType::Roots));
    }

    #[test]
    fn test_stop_clears_both_ends_and_escape_counter() {
        let (mut session, naga, rat) = session_with_pair();
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        session.world.actor_mut(rat).unwrap().constriction_mut().escape_attempts = 3;
        assert!(stop_constricting(&mut session, naga, rat, true));
        assert!(!stop_constricting(&mut session, naga, rat, true));
        let rat_state = session.world.actor(rat).unwrap().constriction().clone();
        assert_eq!(rat_state, ConstrictionState::default());
        assert!(!session.world.actor(naga).unwrap().constriction().is_constricting());
    }

    #[test]
    fn test_removal_detaches_links() {
        let (mut session, naga, rat) = session_with_pair();
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        session.world.remove_actor(rat);
        assert!(!session.world.actor(naga).unwrap().constriction().is_constricting());
        assert!(links_consistent(&session.world));
    }

    #[test]
    fn test_moving_apart_invalidates_melee_hold() {
        let (mut session, naga, rat) = session_with_pair();
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        assert!(!has_invalid_constrictor(&session, rat, false));
        session.world.actor_mut(rat).unwrap().set_pos(Coord::new(4, 0));
        assert!(has_invalid_constrictor(&session, rat, true));
        clear_invalid_constrictions(&mut session, rat, true);
        assert_eq!(holder_of(&session, rat), None);
        assert!(links_consistent(&session.world));
    }

    #[test]
    fn test_roots_break_on_move_or_water() {
        let (mut session, naga, rat) = session_with_pair();
        session.world.actor_mut(rat).unwrap().set_pos(Coord::new(3, 0));
        start_constricting(&mut session, naga, rat, ConstrictType::Roots, Some(50)).unwrap();
        assert!(session.world.monster(rat).unwrap().has_ench(EnchantKind::Constricted));
        assert!(!has_invalid_constrictor(&session, rat, false));
        assert!(has_invalid_constrictor(&session, rat, true));
        session.world.set_terrain(Coord::new(3, 0), Terrain::DeepWater);
        assert!(has_invalid_constrictor(&session, rat, false));
        assert!(stop_being_constricted(&mut session, rat, true));
        assert!(!session.world.monster(rat).unwrap().has_ench(EnchantKind::Constricted));
    }

    #[test]
    fn test_stop_directly_keeps_roots() {
        let mut session = GameSession::new(3);
        let druid = session.world.add_monster(Monster::new(MonsterType::Generic, "druid"));
        let a = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "a").at(Coord::new(1, 0)));
        let b = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "b").at(Coord::new(3, 3)));
        start_constricting(&mut session, druid, a, ConstrictType::Melee, None).unwrap();
        start_constricting(&mut session, druid, b, ConstrictType::Roots, None).unwrap();
        stop_directly_constricting_all(&mut session, druid, true);
        assert_eq!(holder_of(&session, a), None);
        assert_eq!(holder_of(&session, b), Some(druid));
        stop_constricting_all(&mut session, druid, true);
        assert_eq!(holder_of(&session, b), None);
    }

    #[test]
    fn test_stale_constrictor_cleared_lazily() {
        let (mut session, naga, rat) = session_with_pair();
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        // break the holder's end behind the engine's back
        session
            .world
            .actor_mut(naga)
            .unwrap()
            .constriction_mut()
            .remove_victim(rat);
        assert!(has_invalid_constrictor(&session, rat, false));
        clear_invalid_constrictions(&mut session, rat, false);
        assert_eq!(holder_of(&session, rat), None);
    }

    #[test]
    fn test_handle_constriction_damages_and_kills() {
        let mut session = GameSession::with_rng(GameRng::always_max());
        let naga = session.world.add_monster(
            Monster::new(MonsterType::Naga, "naga").with_attack(crate::actor::MonAttack::new(
                crate::combat::MonAttackKind::Constrict,
                crate::combat::AttackFlavour::Constrict,
                8,
            )),
        );
        let rat = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "rat").with_hp(10).at(Coord::new(1, 1)));
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        handle_constriction(&mut session, naga).unwrap();
        assert_eq!(session.world.actor(rat).unwrap().hp(), 2);
        handle_constriction(&mut session, naga).unwrap();
        assert!(session.world.actor(rat).is_none());
        assert_eq!(session.deaths().len(), 1);
        assert_eq!(session.deaths()[0].cause, DeathCause::Constriction);
        assert!(!session.world.actor(naga).unwrap().constriction().is_constricting());
    }

    #[test]
    fn test_sanctuary_releases_everyone() {
        let (mut session, naga, rat) = session_with_pair();
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, None).unwrap();
        session.world.add_sanctuary(Coord::new(0, 0));
        handle_constriction(&mut session, naga).unwrap();
        assert_eq!(holder_of(&session, rat), None);
        assert_eq!(session.world.actor(rat).unwrap().hp(), 20);
    }

    #[test]
    fn test_escape_eventually_succeeds_when_easier() {
        let mut session = GameSession::with_rng(GameRng::always_max());
        session.world.set_player(Player::new("Hero").with_stats(10, 10, 10).at(Coord::new(1, 0)));
        let naga = session
            .world
            .add_monster(Monster::new(MonsterType::Naga, "naga").with_hd(4));
        start_constricting(&mut session, naga, Mid::PLAYER, ConstrictType::Melee, None).unwrap();
        // power 5 against 5 + 5 + 4 with maxed dice: needs a factor of 3
        assert!(!attempt_escape(&mut session, Mid::PLAYER).unwrap());
        assert!(!attempt_escape(&mut session, Mid::PLAYER).unwrap());
        assert!(attempt_escape(&mut session, Mid::PLAYER).unwrap());
        assert_eq!(holder_of(&session, Mid::PLAYER), None);
        assert_eq!(
            session.world.actor(Mid::PLAYER).unwrap().constriction().escape_attempts,
            0
        );
    }

    #[test]
    fn test_escape_trend_is_configurable() {
        let mut session = GameSession::with_rng(GameRng::always_max());
        session.config.escape.melee.trend = EscapeTrend::Harder;
        session.world.set_player(Player::new("Hero").with_stats(10, 10, 10).at(Coord::new(1, 0)));
        let naga = session
            .world
            .add_monster(Monster::new(MonsterType::Naga, "naga").with_hd(4));
        start_constricting(&mut session, naga, Mid::PLAYER, ConstrictType::Melee, None).unwrap();
        // 5 * 4 beats 14 on the first try, then it only gets harder
        assert!(attempt_escape(&mut session, Mid::PLAYER).unwrap());
    }

    #[test]
    fn test_escape_requires_hold() {
        let (mut session, _naga, rat) = session_with_pair();
        assert_eq!(
            attempt_escape(&mut session, rat),
            Err(CombatError::NotConstricted(rat))
        );
    }
}
