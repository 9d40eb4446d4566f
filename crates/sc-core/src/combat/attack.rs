//! The attack transaction

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, trace};

use crate::actor::{Actor, Creature, Missile, Mid, Skill};
use crate::consts::AUTOMATIC_HIT;
use crate::error::{CombatError, CombatResult};
use crate::message::{MsgChannel, capitalise, possessive, the_name};
use crate::random_var::RandomVar;
use crate::rng::GameRng;
use crate::session::{DeathCause, GameSession, Responsible};

use super::ac::{AcRule, ac_damage_var, apply_ac};
use super::effects::{Line, brand_bonus, on_hit_effects};
use super::strategy::{
    ArmedMelee, AttackSnapshot, AttackStrategy, MonsterMelee, RangedMissile, UnarmedMelee,
};
use super::{Brand, HitEffect, MissileBrand};

/// Stages an attack passes through, in order.
///
/// An outcome lists only the stages that actually happened: a miss shows
/// `Dodged`, a block shows `Blocked`, and neither shows `Hit`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
pub enum AttackPhase {
    Attempted,
    Dodged,
    Blocked,
    Hit,
    Damaged,
    Killed,
    End,
}

/// Per-attack overrides of the random rolls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOptions {
    /// `Some(true)` always lands, `Some(false)` always misses
    pub forced_hit: Option<bool>,
    /// Replaces the block roll only; a shield with no blocks left still fails
    pub forced_block: Option<bool>,
}

impl AttackOptions {
    pub fn always_hit() -> Self {
        Self {
            forced_hit: Some(true),
            forced_block: None,
        }
    }

    pub fn always_miss() -> Self {
        Self {
            forced_hit: Some(false),
            forced_block: None,
        }
    }

    pub fn with_forced_block(mut self, block: bool) -> Self {
        self.forced_block = Some(block);
        self
    }
}

/// A projectile bounced back toward where it came from.
///
/// The follow-up shot visually comes from the reflector. Credit stays with
/// whoever was responsible for the original shot, unless the player did the
/// reflecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub reflector: Mid,
    pub target: Mid,
    pub responsible: Responsible,
}

impl Reflection {
    /// Build the return shot.
    pub fn follow_up(&self, session: &GameSession, missile: Missile) -> CombatResult<Attack> {
        Ok(Attack::ranged(session, self.reflector, self.target, missile)?.with_responsible(self.responsible))
    }
}

/// What an attack did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// False if the attacker could not act at all
    pub attack_occurred: bool,
    pub hit: bool,
    pub blocked: bool,
    pub reflected: Option<Reflection>,
    /// Main damage inflicted, after armour and stab bonus
    pub damage_done: i32,
    /// Extra damage from brands and flavours
    pub special_damage: i32,
    pub stab: bool,
    pub killed: bool,
    pub phases: Vec<AttackPhase>,
    pub effects: Vec<HitEffect>,
}

/// Uniform step for to-hit against evasion.
///
/// Returns the margin; the attack lands when it is not negative. A small
/// fixed share of attacks hit or miss outright, and a to-hit of
/// [`AUTOMATIC_HIT`] always lands. Monsters attacking get the defender's
/// evasion randomised.
pub fn test_hit(rng: &mut GameRng, to_land: i32, ev: i32, randomise_ev: bool, auto_percent: i32) -> i32 {
    if to_land >= AUTOMATIC_HIT {
        return AUTOMATIC_HIT;
    }
    if rng.x_chance_in_y(auto_percent, 100) {
        return if rng.coinflip() {
            AUTOMATIC_HIT
        } else {
            -AUTOMATIC_HIT
        };
    }
    let ev = if randomise_ev {
        rng.random2avg(2 * ev.max(0), 2)
    } else {
        ev.max(0)
    };
    to_land - ev
}

fn conjugate(verb: &str, player: bool) -> String {
    if player {
        verb.to_string()
    } else if verb.ends_with("ch") || verb.ends_with("sh") || verb.ends_with('s') {
        format!("{verb}es")
    } else {
        format!("{verb}s")
    }
}

/// Block strength of a shield bearer.
fn shield_bonus(defender: &Creature) -> i32 {
    let base = defender.shield().map_or(0, |s| s.bonus);
    match defender {
        Creature::Player(p) => base * 2 + p.skill(Skill::Shields) + p.dexterity / 5,
        Creature::Monster(m) => base * 2 + m.effective_hd() / 3,
    }
}

/// Attacker's ability to get past a shield.
const SHIELD_BYPASS_BASE: i32 = 15;

/// One attack from `attacker` against `defender`.
///
/// Build it, call [`Attack::attack`] once, then drop it.
#[derive(Debug)]
pub struct Attack {
    attacker: Mid,
    defender: Mid,
    responsible: Responsible,
    strategy: Box<dyn AttackStrategy>,
    snapshot: AttackSnapshot,
    options: AttackOptions,
    resolved: bool,
    to_hit: i32,
    ev_margin: i32,
    messages: Vec<Line>,
    phases: Vec<AttackPhase>,
}

impl Attack {
    fn build(attacker: Mid, defender: Mid, strategy: Box<dyn AttackStrategy>, snapshot: AttackSnapshot) -> Self {
        Self {
            attacker,
            defender,
            responsible: Responsible::from(attacker),
            strategy,
            snapshot,
            options: AttackOptions::default(),
            resolved: false,
            to_hit: 0,
            ev_margin: 0,
            messages: Vec::new(),
            phases: Vec::new(),
        }
    }

    fn lookup(session: &GameSession, mid: Mid) -> CombatResult<&Creature> {
        session.world.actor(mid).ok_or(CombatError::ActorNotFound(mid))
    }

    /// Melee with whatever the attacker has: a weapon, bare hands or, for a
    /// monster, its first natural attack.
    pub fn melee(session: &GameSession, attacker: Mid, defender: Mid) -> CombatResult<Self> {
        Self::lookup(session, defender)?;
        let a = Self::lookup(session, attacker)?;
        match a {
            Creature::Monster(_) => Self::monster_melee(session, attacker, defender, 0),
            Creature::Player(p) => {
                let strategy: Box<dyn AttackStrategy> = if p.weapon.is_some() {
                    Box::new(ArmedMelee)
                } else {
                    Box::new(UnarmedMelee)
                };
                let snapshot = AttackSnapshot::capture(a, None, None);
                Ok(Self::build(attacker, defender, strategy, snapshot))
            }
        }
    }

    /// Melee using a monster's natural attack in slot `index`.
    pub fn monster_melee(session: &GameSession, attacker: Mid, defender: Mid, index: usize) -> CombatResult<Self> {
        Self::lookup(session, defender)?;
        let a = Self::lookup(session, attacker)?;
        let m = a.as_monster().ok_or(CombatError::NotAMonster(attacker))?;
        let slot = m
            .attacks
            .get(index)
            .copied()
            .ok_or(CombatError::NoSuchAttack { mid: attacker, index })?;
        let snapshot = AttackSnapshot::capture(a, Some(slot), None);
        Ok(Self::build(attacker, defender, Box::new(MonsterMelee), snapshot))
    }

    /// A thrown or fired projectile.
    pub fn ranged(session: &GameSession, attacker: Mid, defender: Mid, missile: Missile) -> CombatResult<Self> {
        Self::lookup(session, defender)?;
        let a = Self::lookup(session, attacker)?;
        let snapshot = AttackSnapshot::capture(a, None, Some(missile));
        Ok(Self::build(attacker, defender, Box::new(RangedMissile), snapshot))
    }

    /// Attack with a custom strategy.
    pub fn with_strategy(
        session: &GameSession,
        attacker: Mid,
        defender: Mid,
        strategy: Box<dyn AttackStrategy>,
        snapshot: AttackSnapshot,
    ) -> CombatResult<Self> {
        Self::lookup(session, defender)?;
        Self::lookup(session, attacker)?;
        Ok(Self::build(attacker, defender, strategy, snapshot))
    }

    pub fn with_responsible(mut self, responsible: Responsible) -> Self {
        self.responsible = responsible;
        self
    }

    pub fn with_options(mut self, options: AttackOptions) -> Self {
        self.options = options;
        self
    }

    pub fn attacker(&self) -> Mid {
        self.attacker
    }

    pub fn defender(&self) -> Mid {
        self.defender
    }

    pub fn responsible(&self) -> Responsible {
        self.responsible
    }

    pub fn is_ranged(&self) -> bool {
        self.strategy.is_ranged()
    }

    pub fn resolved(&self) -> bool {
        self.resolved
    }

    pub fn snapshot(&self) -> &AttackSnapshot {
        &self.snapshot
    }

    /// Margin of the last to-hit test; negative on a miss.
    pub fn ev_margin(&self) -> i32 {
        self.ev_margin
    }

    fn participants<'s>(&self, session: &'s GameSession) -> CombatResult<(&'s Creature, &'s Creature)> {
        Ok((
            Self::lookup(session, self.attacker)?,
            Self::lookup(session, self.defender)?,
        ))
    }

    /// To-hit after situational modifiers, before the random roll.
    fn to_hit_total(&self, session: &GameSession) -> CombatResult<i32> {
        let (a, d) = self.participants(session)?;
        let cfg = &session.config;
        let mut total = self.strategy.to_hit_base(&self.snapshot);
        if a.confused() {
            total -= cfg.confusion_to_hit_penalty;
        }
        if d.invisible() && !a.see_invisible() {
            if a.is_player() {
                total -= cfg.invisible_player_penalty;
            } else {
                total = total * (100 - cfg.invisible_monster_percent) / 100;
            }
        }
        if self.strategy.is_ranged() && d.missile_repulsion() {
            total /= 2;
        }
        Ok(total.max(0))
    }

    /// Distribution of the rolled to-hit.
    pub fn to_hit_distribution(&self, session: &GameSession) -> CombatResult<RandomVar> {
        let total = self.to_hit_total(session)?;
        Ok(if total >= AUTOMATIC_HIT {
            RandomVar::constant(total)
        } else {
            RandomVar::random2(total)
        })
    }

    /// Chance the attack gets past evasion, ignoring shields.
    pub fn hit_probability(&self, session: &GameSession) -> CombatResult<f64> {
        if let Some(forced) = self.options.forced_hit {
            return Ok(if forced { 1.0 } else { 0.0 });
        }
        let total = self.to_hit_total(session)?;
        if total >= AUTOMATIC_HIT {
            return Ok(1.0);
        }
        let (_, d) = self.participants(session)?;
        let ev = d.evasion().max(0);
        let ev_var = if self.snapshot.attacker_is_player {
            RandomVar::constant(ev)
        } else {
            (RandomVar::random2(2 * ev) + RandomVar::random2(2 * ev + 1)).map(|x| x / 2)
        };
        let margin = RandomVar::random2(total).flat_map(|t| ev_var.map(|e| t - e));
        let auto = f64::from(session.config.auto_hit_miss_percent.clamp(0, 100)) / 100.0;
        Ok(auto * 0.5 + (1.0 - auto) * margin.probability(|m| m >= 0))
    }

    /// Expected damage of a landed hit after armour, before brands and
    /// stabbing.
    pub fn expected_damage(&self, session: &GameSession) -> CombatResult<f64> {
        let (_, d) = self.participants(session)?;
        let raw = self
            .strategy
            .weapon_damage(&self.snapshot)
            .map(|r| self.strategy.scale_damage(&self.snapshot, r));
        Ok(ac_damage_var(&raw, d.armour_class(), d.gdr_percent(), AcRule::Normal).expected())
    }

    fn check_participants(&self, session: &GameSession) -> CombatResult<()> {
        for mid in [self.attacker, self.defender] {
            let actor = Self::lookup(session, mid)?;
            if !actor.alive() || session.is_dead(mid) {
                return Err(CombatError::ActorDead(mid));
            }
        }
        Ok(())
    }

    /// Resolve the attack.
    ///
    /// Rejects a dead or missing attacker or defender, and a second call on
    /// the same transaction, before anything changes. A miss or a block
    /// leaves the defender untouched.
    pub fn attack(&mut self, session: &mut GameSession) -> CombatResult<AttackOutcome> {
        if self.resolved {
            return Err(CombatError::AttackAlreadyResolved);
        }
        self.check_participants(session)?;
        self.resolved = true;

        let mut outcome = AttackOutcome::default();
        self.phases.push(AttackPhase::Attempted);
        let stunned = session
            .world
            .actor(self.attacker)
            .is_some_and(|a| a.cannot_act());
        if stunned {
            debug!(attacker = %self.attacker, "attacker cannot act");
            outcome.phases = std::mem::take(&mut self.phases);
            return Ok(outcome);
        }
        outcome.attack_occurred = true;

        if !self.roll_to_hit(session)? {
            self.phases.push(AttackPhase::Dodged);
            self.say_miss(session);
            return Ok(self.end(session, outcome));
        }

        if let Some(reflection) = self.attempt_block(session)? {
            self.phases.push(AttackPhase::Blocked);
            outcome.blocked = true;
            outcome.reflected = reflection;
            return Ok(self.end(session, outcome));
        }

        self.phases.push(AttackPhase::Hit);
        outcome.hit = true;
        let (damage, special) = self.calc_damage(session, &mut outcome)?;

        self.phases.push(AttackPhase::Damaged);
        let alive = self.inflict(session, damage, special, &mut outcome);

        if !alive {
            self.phases.push(AttackPhase::Killed);
            outcome.killed = true;
            self.flush(session);
            let cause = if self.strategy.is_ranged() {
                DeathCause::Ranged
            } else {
                DeathCause::Melee
            };
            session.monster_die(self.defender, cause, self.responsible);
        }
        Ok(self.end(session, outcome))
    }

    fn roll_to_hit(&mut self, session: &mut GameSession) -> CombatResult<bool> {
        if let Some(forced) = self.options.forced_hit {
            self.ev_margin = if forced { AUTOMATIC_HIT } else { -AUTOMATIC_HIT };
            return Ok(forced);
        }
        let total = self.to_hit_total(session)?;
        let to_land = if total >= AUTOMATIC_HIT {
            total
        } else {
            session.rng.random2(total)
        };
        self.to_hit = to_land;
        let (_, d) = self.participants(session)?;
        let ev = d.evasion();
        let margin = test_hit(
            &mut session.rng,
            to_land,
            ev,
            !self.snapshot.attacker_is_player,
            session.config.auto_hit_miss_percent,
        );
        trace!(attacker = %self.attacker, defender = %self.defender, total, to_land, ev, margin, "to-hit");
        self.ev_margin = margin;
        Ok(margin >= 0)
    }

    /// Shield check. `Ok(Some(_))` when blocked, carrying any reflection.
    fn attempt_block(&mut self, session: &mut GameSession) -> CombatResult<Option<Option<Reflection>>> {
        if self.attacker == self.defender {
            return Ok(None);
        }
        let (a, d) = self.participants(session)?;
        let Some(shield) = d.shield() else {
            return Ok(None);
        };
        if d.incapacitated() || shield.exhausted() {
            return Ok(None);
        }
        let mut pro_block = shield_bonus(d);
        if a.invisible() && !d.see_invisible() {
            pro_block /= 3;
        }
        let reflects = self.strategy.is_ranged() && (shield.reflective || d.reflection());
        let defender_is_player = d.is_player();
        let text = self.block_text(a, d, reflects);

        let blocked = match self.options.forced_block {
            Some(forced) => forced,
            None => {
                let con_block = session.rng.random2(SHIELD_BYPASS_BASE + self.to_hit / 2);
                pro_block >= con_block
            }
        };
        if !blocked {
            return Ok(None);
        }
        if let Some(s) = session
            .world
            .actor_mut(self.defender)
            .and_then(|d| d.shield_mut())
        {
            s.consume_block();
        }
        self.messages.push((MsgChannel::Combat, text));
        debug!(attacker = %self.attacker, defender = %self.defender, reflects, "blocked");

        let reflection = reflects.then(|| Reflection {
            reflector: self.defender,
            target: self.attacker,
            responsible: if defender_is_player {
                Responsible::PlayerFaultless
            } else {
                self.responsible
            },
        });
        Ok(Some(reflection))
    }

    fn calc_damage(&mut self, session: &mut GameSession, outcome: &mut AttackOutcome) -> CombatResult<(i32, i32)> {
        let raw = self.strategy.weapon_damage(&self.snapshot).roll(&mut session.rng);
        let scaled = self.strategy.scale_damage(&self.snapshot, raw);

        let (ac, gdr) = {
            let (_, d) = self.participants(session)?;
            (d.armour_class(), d.gdr_percent())
        };
        let mut damage = apply_ac(&mut session.rng, scaled, ac, gdr, AcRule::Normal);

        if self.snapshot.brand == Brand::Chaos
            && let Some(&b) = session.rng.choose(&Brand::CHAOS_CHOICES)
        {
            self.snapshot.brand = b;
            outcome.effects.push(HitEffect::ChaosBrand(b));
        }
        if self.snapshot.missile_brand == MissileBrand::Chaos
            && let Some(&b) = session.rng.choose(&MissileBrand::CHAOS_CHOICES)
        {
            self.snapshot.missile_brand = b;
            outcome.effects.push(HitEffect::ChaosMissile(b));
        }

        let d = session
            .world
            .actor(self.defender)
            .ok_or(CombatError::ActorNotFound(self.defender))?;
        let special = brand_bonus(&mut session.rng, &self.snapshot, &**d, damage);
        if special > 0 {
            outcome.effects.push(HitEffect::BrandDamage(special));
        }

        if self.strategy.can_stab(&self.snapshot) && !d.is_player() {
            let cfg = &session.config;
            if d.cannot_act() {
                damage *= cfg.stab_helpless_multiplier;
                outcome.stab = true;
            } else if d.confused() || d.fleeing() {
                damage = damage * cfg.stab_distracted_percent / 100;
                outcome.stab = true;
            }
            if outcome.stab {
                outcome.effects.push(HitEffect::Stabbed {
                    target: self.defender,
                });
            }
        }
        trace!(raw, scaled, ac, damage, special, stab = outcome.stab, "damage");
        Ok((damage, special))
    }

    /// Apply damage and on-hit effects. Returns whether the defender lives.
    fn inflict(&mut self, session: &mut GameSession, damage: i32, special: i32, outcome: &mut AttackOutcome) -> bool {
        let total = damage + special;
        let Some(d) = session.world.actor_mut(self.defender) else {
            return false;
        };
        let lost = d.hurt(total);
        let alive = d.alive();
        if alive {
            d.wake_up();
        }
        outcome.damage_done = damage;
        outcome.special_damage = special;

        if let Ok((a, d)) = self.participants(session) {
            let text = self.hit_text(a, d, total);
            self.messages.push((MsgChannel::Combat, text));
        }
        // hit line before anything the effects announce
        self.flush(session);

        if alive {
            let effects = on_hit_effects(
                session,
                self.attacker,
                self.defender,
                &self.snapshot,
                lost,
                &mut self.messages,
            );
            outcome.effects.extend(effects);
        }
        alive
    }

    fn end(&mut self, session: &mut GameSession, mut outcome: AttackOutcome) -> AttackOutcome {
        self.flush(session);
        if let Some(a) = session.world.actor_mut(self.attacker) {
            a.note_swing();
        }
        self.phases.push(AttackPhase::End);
        outcome.phases = std::mem::take(&mut self.phases);
        debug!(
            attacker = %self.attacker,
            defender = %self.defender,
            hit = outcome.hit,
            blocked = outcome.blocked,
            damage = outcome.damage_done,
            special = outcome.special_damage,
            killed = outcome.killed,
            "attack resolved"
        );
        outcome
    }

    fn flush(&mut self, session: &mut GameSession) {
        for (channel, text) in self.messages.drain(..) {
            session.say(channel, text);
        }
    }

    fn missile_name(&self) -> Option<&str> {
        self.snapshot.missile.as_ref().map(|m| m.name.as_str())
    }

    fn say_miss(&mut self, session: &GameSession) {
        let Ok((a, d)) = self.participants(session) else {
            return;
        };
        let text = match self.missile_name() {
            Some(missile) => format!("The {missile} misses {}.", the_name(&**d)),
            None => format!(
                "{} {} {}.",
                capitalise(&the_name(&**a)),
                conjugate("miss", a.is_player()),
                the_name(&**d)
            ),
        };
        self.messages.push((MsgChannel::Combat, text));
    }

    fn block_text(&self, a: &Creature, d: &Creature, reflects: bool) -> String {
        match self.missile_name() {
            Some(missile) if reflects => format!(
                "{} {} the {missile} back!",
                capitalise(&the_name(&**d)),
                conjugate("reflect", d.is_player())
            ),
            Some(missile) => format!(
                "{} {} the {missile}.",
                capitalise(&the_name(&**d)),
                conjugate("block", d.is_player())
            ),
            None => format!(
                "{} {} {} attack.",
                capitalise(&the_name(&**d)),
                conjugate("block", d.is_player()),
                possessive(&**a)
            ),
        }
    }

    fn hit_text(&self, a: &Creature, d: &Creature, total: i32) -> String {
        let mut text = match self.missile_name() {
            Some(missile) => format!("The {missile} hits {}", the_name(&**d)),
            None => format!(
                "{} {} {}",
                capitalise(&the_name(&**a)),
                conjugate(self.strategy.verb(&self.snapshot), a.is_player()),
                the_name(&**d)
            ),
        };
        if total <= 0 {
            text.push_str(" but does no damage");
        }
        text.push('.');
        text
    }
}
