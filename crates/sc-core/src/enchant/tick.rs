//! Enchantment lifecycle: application, per-tick effects, decay and expiry

use tracing::{debug, trace};

use crate::actor::{Actor, EffectSource, Mid, Monster, PlayerDuration};
use crate::consts::{BASELINE_DELAY, INFINITE_DURATION, MIN_ENCH_DURATION, NORMAL_SPEED};
use crate::constrict;
use crate::error::{CombatError, CombatResult};
use crate::message::{MsgChannel, capitalise, the_name};
use crate::resist::resist_adjust_damage;
use crate::rng::GameRng;
use crate::session::{DeathCause, GameSession, Responsible};

use super::{EnchantKind, MonEnchant};

/// Time an actor of `speed` needs for one normal action.
fn speed_to_duration(speed: i32) -> i32 {
    (BASELINE_DELAY * NORMAL_SPEED / speed.max(1)).max(1)
}

fn monster(session: &GameSession, mid: Mid) -> CombatResult<&Monster> {
    match session.world.actor(mid) {
        None => Err(CombatError::ActorNotFound(mid)),
        Some(a) => a.as_monster().ok_or(CombatError::NotAMonster(mid)),
    }
}

fn monster_mut(session: &mut GameSession, mid: Mid) -> CombatResult<&mut Monster> {
    match session.world.actor_mut(mid) {
        None => Err(CombatError::ActorNotFound(mid)),
        Some(a) => a.as_monster_mut().ok_or(CombatError::NotAMonster(mid)),
    }
}

/// Default length of an effect applied without one.
///
/// Longer for effects that stack in degree, shorter for fast monsters, and
/// fuzzed to between 60% and 120% of the nominal value.
pub fn calc_duration(rng: &mut GameRng, monster: &Monster, kind: EnchantKind, degree: i32) -> i32 {
    let deg = degree.max(1);
    let turns = match kind {
        EnchantKind::Poison | EnchantKind::StickyFlame | EnchantKind::Drained => kind.base_turns() * deg,
        EnchantKind::Abjuration => kind.base_turns() * deg.min(4) + if deg >= 5 { 50 } else { 0 },
        _ => kind.base_turns(),
    }
    .max(2);
    let raw = turns * speed_to_duration(monster.speed());
    let fuzzed = raw * 60 / 100 + rng.random2(raw * 60 / 100 + 1);
    fuzzed.clamp(MIN_ENCH_DURATION, INFINITE_DURATION - 1)
}

/// Apply an effect to a monster, merging with any it already has.
///
/// A zero duration is replaced by [`calc_duration`]. Returns false if the
/// monster refuses the effect.
pub fn add_ench(session: &mut GameSession, mid: Mid, mut ench: MonEnchant) -> CombatResult<bool> {
    if ench.duration <= 0 {
        monster(session, mid)?;
        if let Some(m) = session.world.monster(mid) {
            ench.duration = calc_duration(&mut session.rng, m, ench.kind, ench.degree);
            ench.max_duration = ench.max_duration.max(ench.duration);
        }
    }
    let kind = ench.kind;
    let added = monster_mut(session, mid)?.add_ench(ench);
    trace!(%mid, %kind, added, "add enchantment");
    Ok(added)
}

/// Cure an effect outright. Returns whether the monster had it.
pub fn del_ench(session: &mut GameSession, mid: Mid, kind: EnchantKind, quiet: bool) -> CombatResult<bool> {
    let removed = monster_mut(session, mid)?.del_ench(kind, false).is_some();
    if removed {
        after_removal(session, mid, kind, false, quiet);
    }
    Ok(removed)
}

/// Side effects that need more than the monster itself.
fn after_removal(session: &mut GameSession, mid: Mid, kind: EnchantKind, expired: bool, quiet: bool) {
    if !quiet
        && let Some(clause) = kind.removal_message()
        && let Some(m) = session.world.actor(mid)
    {
        let text = format!("{} {clause}", capitalise(&the_name(&**m)));
        session.say(MsgChannel::Status, text);
    }
    debug!(%mid, %kind, expired, "enchantment removed");
    match kind {
        EnchantKind::Constricted => {
            constrict::stop_being_constricted(session, mid, quiet);
        }
        EnchantKind::Abjuration if expired => {
            session.monster_die(mid, DeathCause::Abjured, Responsible::Unattributed);
        }
        EnchantKind::Berserk if expired => {
            let duration = session.rng.random_range(70, 130);
            if let Some(m) = session.world.monster_mut(mid) {
                m.add_ench(MonEnchant::new(EnchantKind::Slow, 1, EffectSource::NONE, duration));
            }
        }
        EnchantKind::Petrifying if expired && !quiet => {
            if let Some(m) = session.world.actor(mid) {
                let text = format!("{} turns to stone!", capitalise(&the_name(&**m)));
                session.say(MsgChannel::Status, text);
            }
        }
        _ => {}
    }
}

fn expire(session: &mut GameSession, mid: Mid, kind: EnchantKind) -> CombatResult<()> {
    if monster_mut(session, mid)?.del_ench(kind, true).is_some() {
        after_removal(session, mid, kind, true, false);
    }
    Ok(())
}

/// Strip `levels` degrees. The effect goes entirely when nothing is left.
/// Permanent effects are only touched when `infinite` is set.
///
/// Returns whether the effect was removed.
pub fn lose_ench_levels(
    session: &mut GameSession,
    mid: Mid,
    kind: EnchantKind,
    levels: i32,
    infinite: bool,
) -> CombatResult<bool> {
    let m = monster_mut(session, mid)?;
    let Some(e) = m.enchantments.get_mut(kind) else {
        return Ok(false);
    };
    if levels <= 0 || (e.duration >= INFINITE_DURATION && !infinite) {
        return Ok(false);
    }
    if e.degree > levels {
        e.degree -= levels;
        return Ok(false);
    }
    del_ench(session, mid, kind, false)
}

/// Shorten an effect. It expires when the remaining time runs out.
///
/// Returns whether the effect was removed.
pub fn lose_ench_duration(session: &mut GameSession, mid: Mid, kind: EnchantKind, amount: i32) -> CombatResult<bool> {
    let m = monster_mut(session, mid)?;
    let Some(e) = m.enchantments.get_mut(kind) else {
        return Ok(false);
    };
    if amount <= 0 || e.duration >= INFINITE_DURATION {
        return Ok(false);
    }
    if e.duration > amount {
        e.duration -= amount;
        return Ok(false);
    }
    expire(session, mid, kind)?;
    Ok(true)
}

/// Run one turn's worth of decay on an effect.
///
/// Held victims struggle at their own speed; everything else loses one
/// normal turn. With `decay_degree`, degree also falls as the effect wears
/// down, faster at higher degrees, and a single degree never decays on its
/// own. Returns whether the effect was removed.
pub fn decay_enchantment(session: &mut GameSession, mid: Mid, kind: EnchantKind, decay_degree: bool) -> CombatResult<bool> {
    let m = monster(session, mid)?;
    let Some(e) = m.get_ench(kind) else {
        return Ok(false);
    };
    if e.duration >= INFINITE_DURATION {
        return Ok(false);
    }
    let spent = if kind == EnchantKind::Constricted {
        speed_to_duration(m.speed())
    } else {
        BASELINE_DELAY
    };
    if lose_ench_duration(session, mid, kind, spent)? {
        return Ok(true);
    }
    if !decay_degree {
        return Ok(false);
    }

    let m = monster_mut(session, mid)?;
    let Some(e) = m.enchantments.get_mut(kind) else {
        return Ok(false);
    };
    if e.degree <= 1 {
        return Ok(false);
    }
    let factor = e.degree * (e.degree + 1) / 2;
    if e.duration < e.max_duration * (factor - 1) / factor {
        e.degree -= 1;
        e.max_duration = e.duration;
        trace!(%mid, %kind, degree = e.degree, "enchantment degree decayed");
    }
    Ok(false)
}

/// Per-tick processing of every effect on a monster.
///
/// Works from a snapshot of the kinds present at the start, in kind order,
/// and skips any that an earlier step removed. Returns the kinds that ran
/// out. Stops early if the monster dies.
pub fn apply_enchantments(session: &mut GameSession, mid: Mid) -> CombatResult<Vec<EnchantKind>> {
    let kinds = monster(session, mid)?.enchantments.kinds();
    let mut expired = Vec::new();
    for kind in kinds {
        let Ok(m) = monster(session, mid) else {
            break;
        };
        if !m.has_ench(kind) {
            continue;
        }
        let gone = match kind {
            EnchantKind::Poison => {
                if poison_damage(session, mid)? {
                    break;
                }
                decay_enchantment(session, mid, kind, true)?
            }
            EnchantKind::StickyFlame => {
                if burn_damage(session, mid)? {
                    break;
                }
                decay_enchantment(session, mid, kind, true)?
            }
            _ => decay_enchantment(session, mid, kind, kind.decays_degree())?,
        };
        if gone {
            expired.push(kind);
        }
    }
    Ok(expired)
}

/// Returns whether the monster died.
fn poison_damage(session: &mut GameSession, mid: Mid) -> CombatResult<bool> {
    let m = monster(session, mid)?;
    let (degree, source) = match m.get_ench(EnchantKind::Poison) {
        Some(e) => (e.degree, e.source),
        None => return Ok(false),
    };
    let vulnerable = m.res_poison() < 0;
    let mut damage = if degree >= 4 { 1 } else { 0 };
    if session.rng.coinflip() {
        damage += session.rng.roll_dice(1, degree + 1);
    }
    if vulnerable {
        damage += session.rng.roll_dice(2, degree) - 1;
    }
    trace!(%mid, degree, damage, "poison damage");
    Ok(damage_over_time(session, mid, damage, source, DeathCause::Poison))
}

/// Returns whether the monster died.
fn burn_damage(session: &mut GameSession, mid: Mid) -> CombatResult<bool> {
    let m = monster(session, mid)?;
    let Some(source) = m.get_ench(EnchantKind::StickyFlame).map(|e| e.source) else {
        return Ok(false);
    };
    let fire = m.res_fire();
    let raw = session.rng.roll_dice(2, 4) - 1;
    let damage = resist_adjust_damage(fire, raw);
    if damage > 0
        && let Some(m) = session.world.actor(mid)
    {
        let text = format!("{} burns!", capitalise(&the_name(&**m)));
        session.say(MsgChannel::Combat, text);
    }
    Ok(damage_over_time(session, mid, damage, source, DeathCause::Burning))
}

fn damage_over_time(session: &mut GameSession, mid: Mid, damage: i32, source: Mid, cause: DeathCause) -> bool {
    if damage <= 0 {
        return false;
    }
    let alive = session.world.actor_mut(mid).is_some_and(|m| {
        m.hurt(damage);
        m.alive()
    });
    if !alive {
        session.monster_die(mid, cause, Responsible::from(source));
    }
    !alive
}

/// Poison points the player sheds per normal turn.
const PLAYER_POISON_RECOVERY: i32 = 1;

/// Advance the player's timed statuses by `elapsed` time units.
///
/// Expired statuses are announced in order. Poison hurts one point per
/// turn until it wears off and can kill. Returns the statuses that ran out.
pub fn tick_player(session: &mut GameSession, elapsed: i32) -> CombatResult<Vec<PlayerDuration>> {
    if session.is_dead(Mid::PLAYER) {
        return Err(CombatError::ActorDead(Mid::PLAYER));
    }
    let player = session
        .world
        .player_mut()
        .ok_or(CombatError::ActorNotFound(Mid::PLAYER))?;
    let expired = player.tick_durations(elapsed);

    let turns = (elapsed / BASELINE_DELAY).max(1);
    let mut poison_hurt = 0;
    let mut recovered = false;
    if player.poison_level > 0 {
        poison_hurt = turns.min(player.poison_level);
        player.poison_level = (player.poison_level - turns * PLAYER_POISON_RECOVERY).max(0);
        player.hurt(poison_hurt);
        recovered = player.poison_level == 0;
    }
    let alive = player.alive();

    for d in &expired {
        session.say(MsgChannel::Status, d.expiry_message());
        if *d == PlayerDuration::Constricted {
            constrict::stop_being_constricted(session, Mid::PLAYER, false);
        }
    }
    if poison_hurt > 0 {
        trace!(damage = poison_hurt, "player poison");
    }
    if recovered && alive {
        session.say(MsgChannel::Status, "You feel better.");
    }
    if !alive {
        session.monster_die(Mid::PLAYER, DeathCause::Poison, Responsible::Unattributed);
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{MonsterType, Player};
    use crate::constrict::{ConstrictType, links_consistent, start_constricting};
    use crate::message::MessageLog;
    use crate::world::Coord;

    fn one_rat(seed: u64) -> (GameSession, Mid) {
        let mut session = GameSession::new(seed);
        let rat = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "rat").with_hp(40));
        (session, rat)
    }

    fn ench(kind: EnchantKind, degree: i32, duration: i32) -> MonEnchant {
        MonEnchant::new(kind, degree, EffectSource::NONE, duration)
    }

    #[test]
    fn test_zero_duration_gets_default() {
        let (mut session, rat) = one_rat(3);
        assert!(add_ench(&mut session, rat, ench(EnchantKind::Slow, 1, 0)).unwrap());
        let e = session.world.monster(rat).unwrap().get_ench(EnchantKind::Slow).unwrap().clone();
        assert!(e.duration >= MIN_ENCH_DURATION);
        assert!(e.duration < INFINITE_DURATION);
        assert_eq!(e.max_duration, e.duration);
    }

    #[test]
    fn test_calc_duration_in_fuzz_range() {
        let (mut session, rat) = one_rat(11);
        let m = session.world.monster(rat).unwrap().clone();
        for _ in 0..50 {
            let d = calc_duration(&mut session.rng, &m, EnchantKind::Haste, 1);
            assert!((60..=120).contains(&d), "{d}");
        }
    }

    #[test]
    fn test_expiry_announces_and_removes() {
        let (mut session, rat) = one_rat(1);
        let log = MessageLog::shared();
        session.set_sink(Box::new(log.clone()));
        add_ench(&mut session, rat, ench(EnchantKind::Slow, 1, BASELINE_DELAY)).unwrap();
        let expired = apply_enchantments(&mut session, rat).unwrap();
        assert_eq!(expired, vec![EnchantKind::Slow]);
        assert!(!session.world.monster(rat).unwrap().has_ench(EnchantKind::Slow));
        assert!(log.borrow().contains("The rat is no longer moving slowly."));
    }

    #[test]
    fn test_permanent_effects_never_decay() {
        let (mut session, rat) = one_rat(1);
        add_ench(&mut session, rat, ench(EnchantKind::Invis, 1, INFINITE_DURATION)).unwrap();
        for _ in 0..10 {
            assert!(!decay_enchantment(&mut session, rat, EnchantKind::Invis, true).unwrap());
        }
        assert!(!lose_ench_levels(&mut session, rat, EnchantKind::Invis, 5, false).unwrap());
        assert!(session.world.monster(rat).unwrap().has_ench(EnchantKind::Invis));
        assert!(lose_ench_levels(&mut session, rat, EnchantKind::Invis, 5, true).unwrap());
    }

    #[test]
    fn test_degree_decays_as_duration_falls() {
        let (mut session, rat) = one_rat(1);
        add_ench(&mut session, rat, ench(EnchantKind::Drained, 3, 100)).unwrap();
        decay_enchantment(&mut session, rat, EnchantKind::Drained, true).unwrap();
        let degree = |s: &GameSession| s.world.monster(rat).unwrap().get_ench(EnchantKind::Drained).unwrap().degree;
        assert_eq!(degree(&session), 3);
        decay_enchantment(&mut session, rat, EnchantKind::Drained, true).unwrap();
        assert_eq!(degree(&session), 2);
        let e = session.world.monster(rat).unwrap().get_ench(EnchantKind::Drained).unwrap();
        assert_eq!(e.max_duration, 80);
    }

    #[test]
    fn test_lose_levels_and_duration() {
        let (mut session, rat) = one_rat(1);
        add_ench(&mut session, rat, ench(EnchantKind::Confusion, 3, 50)).unwrap();
        assert!(!lose_ench_levels(&mut session, rat, EnchantKind::Confusion, 1, false).unwrap());
        assert_eq!(
            session.world.monster(rat).unwrap().get_ench(EnchantKind::Confusion).unwrap().degree,
            2
        );
        assert!(!lose_ench_duration(&mut session, rat, EnchantKind::Confusion, 20).unwrap());
        assert!(lose_ench_duration(&mut session, rat, EnchantKind::Confusion, 30).unwrap());
        assert!(!session.world.monster(rat).unwrap().has_ench(EnchantKind::Confusion));
        assert!(!lose_ench_duration(&mut session, rat, EnchantKind::Confusion, 30).unwrap());
    }

    #[test]
    fn test_poison_hurts_until_it_wears_off() {
        let (mut session, rat) = one_rat(42);
        add_ench(&mut session, rat, ench(EnchantKind::Poison, 2, 60)).unwrap();
        for _ in 0..20 {
            apply_enchantments(&mut session, rat).unwrap();
        }
        let m = session.world.monster(rat).unwrap();
        assert!(!m.has_ench(EnchantKind::Poison));
        assert!(m.hp <= 40);
    }

    #[test]
    fn test_poison_kill_is_attributed() {
        let mut session = GameSession::with_rng(GameRng::always_max());
        let rat = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "rat").with_hp(1));
        let source = EffectSource {
            mid: Mid(77),
            who: crate::actor::KillCategory::Other,
        };
        add_ench(&mut session, rat, MonEnchant::new(EnchantKind::Poison, 4, source, 100)).unwrap();
        // always-max draws never take the damage coinflip, but degree 4 hurts anyway
        apply_enchantments(&mut session, rat).unwrap();
        assert!(session.world.actor(rat).is_none());
        let death = &session.deaths()[0];
        assert_eq!(death.cause, DeathCause::Poison);
        assert_eq!(death.responsible, Responsible::Actor(Mid(77)));
    }

    #[test]
    fn test_abjuration_timer_removes_monster() {
        let (mut session, rat) = one_rat(1);
        add_ench(&mut session, rat, ench(EnchantKind::Abjuration, 1, BASELINE_DELAY)).unwrap();
        assert_eq!(
            apply_enchantments(&mut session, rat).unwrap(),
            vec![EnchantKind::Abjuration]
        );
        assert!(session.world.actor(rat).is_none());
        assert_eq!(session.deaths()[0].cause, DeathCause::Abjured);
        assert_eq!(
            apply_enchantments(&mut session, rat),
            Err(CombatError::ActorNotFound(rat))
        );
    }

    #[test]
    fn test_berserk_expiry_leaves_fatigue() {
        let (mut session, rat) = one_rat(1);
        add_ench(&mut session, rat, ench(EnchantKind::Berserk, 1, BASELINE_DELAY)).unwrap();
        apply_enchantments(&mut session, rat).unwrap();
        let m = session.world.monster(rat).unwrap();
        assert!(!m.has_ench(EnchantKind::Berserk));
        assert!(!m.has_ench(EnchantKind::Haste));
        assert!(m.has_ench(EnchantKind::Slow));
    }

    #[test]
    fn test_timed_hold_releases_both_ends() {
        let mut session = GameSession::new(5);
        let naga = session.world.add_monster(
            Monster::new(MonsterType::Naga, "naga").with_hp(30).at(Coord::new(0, 0)),
        );
        let rat = session
            .world
            .add_monster(Monster::new(MonsterType::Generic, "rat").at(Coord::new(1, 0)));
        start_constricting(&mut session, naga, rat, ConstrictType::Melee, Some(BASELINE_DELAY)).unwrap();
        assert!(session.world.monster(rat).unwrap().has_ench(EnchantKind::Constricted));
        apply_enchantments(&mut session, rat).unwrap();
        assert!(!session.world.actor(rat).unwrap().constriction().is_constricted());
        assert!(!session.world.actor(naga).unwrap().constriction().is_constricting());
        assert!(links_consistent(&session.world));
    }

    #[test]
    fn test_not_a_monster() {
        let mut session = GameSession::new(1);
        session.world.set_player(Player::new("Hero"));
        assert_eq!(
            add_ench(&mut session, Mid::PLAYER, ench(EnchantKind::Slow, 1, 10)),
            Err(CombatError::NotAMonster(Mid::PLAYER))
        );
    }

    #[test]
    fn test_player_statuses_expire_with_message() {
        let mut session = GameSession::new(1);
        let log = MessageLog::shared();
        session.set_sink(Box::new(log.clone()));
        session.world.set_player(Player::new("Hero"));
        let p = session.world.player_mut().unwrap();
        p.set_duration(PlayerDuration::Haste, 15);
        p.poison_level = 1;
        let expired = tick_player(&mut session, BASELINE_DELAY).unwrap();
        assert!(expired.is_empty());
        assert_eq!(session.world.player().unwrap().hp, 19);
        assert!(log.borrow().contains("You feel better."));
        let expired = tick_player(&mut session, BASELINE_DELAY).unwrap();
        assert_eq!(expired, vec![PlayerDuration::Haste]);
        assert!(log.borrow().contains("You feel yourself slow down."));
    }
}
