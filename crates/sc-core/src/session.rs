//! Per-game session context
//!
//! Everything one game needs is owned here and passed by `&mut` into every
//! engine entry point: the actor arena, the RNG, tunables, the message sink
//! and the queue of deaths awaiting the (external) death subsystem.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use crate::actor::{Actor, Mid};
use crate::config::CombatConfig;
use crate::constrict;
use crate::message::{MessageSink, MsgChannel, NullSink};
use crate::rng::GameRng;
use crate::world::World;

/// Who answers for damage or a kill.
///
/// Threaded through attacks unchanged; only death records consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Responsible {
    Actor(Mid),
    /// The player caused it without being at fault (e.g. a reflected shot)
    PlayerFaultless,
    Unattributed,
}

impl Responsible {
    pub fn mid(self) -> Option<Mid> {
        match self {
            Responsible::Actor(m) => Some(m),
            Responsible::PlayerFaultless => Some(Mid::PLAYER),
            Responsible::Unattributed => None,
        }
    }
}

impl From<Mid> for Responsible {
    fn from(mid: Mid) -> Self {
        if mid.is_none() {
            Responsible::Unattributed
        } else {
            Responsible::Actor(mid)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum DeathCause {
    Melee,
    Ranged,
    Constriction,
    Poison,
    Burning,
    /// Summoning timer ran out
    Abjured,
}

/// One death, queued for whatever awards experience and drops items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub mid: Mid,
    pub name: String,
    pub was_player: bool,
    pub cause: DeathCause,
    pub responsible: Responsible,
    pub turn: u64,
}

/// State of one game.
#[derive(Debug)]
pub struct GameSession {
    pub world: World,
    pub rng: GameRng,
    pub config: CombatConfig,
    pub turn: u64,
    sink: Box<dyn MessageSink>,
    deaths: Vec<DeathRecord>,
    dead: HashSet<Mid>,
}

impl GameSession {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(GameRng::new(seed))
    }

    pub fn with_rng(rng: GameRng) -> Self {
        Self {
            world: World::new(),
            rng,
            config: CombatConfig::default(),
            turn: 0,
            sink: Box::new(NullSink),
            deaths: Vec::new(),
            dead: HashSet::new(),
        }
    }

    pub fn with_config(mut self, config: CombatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: impl MessageSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn set_sink(&mut self, sink: Box<dyn MessageSink>) {
        self.sink = sink;
    }

    /// Send a line to the message sink.
    pub fn say(&mut self, channel: MsgChannel, text: impl AsRef<str>) {
        self.sink.emit(channel, text.as_ref());
    }

    pub fn deaths(&self) -> &[DeathRecord] {
        &self.deaths
    }

    /// Hand queued deaths to the caller.
    pub fn drain_deaths(&mut self) -> Vec<DeathRecord> {
        std::mem::take(&mut self.deaths)
    }

    /// Whether a death has already been processed for `mid`.
    pub fn is_dead(&self, mid: Mid) -> bool {
        self.dead.contains(&mid)
    }

    /// Process a death exactly once.
    ///
    /// Severs every constriction link involving the actor, removes monsters
    /// from the world and queues a [`DeathRecord`]. The player stays in the
    /// world for the outer game to handle. Returns false if the death was
    /// already processed or the actor is unknown.
    pub fn monster_die(&mut self, mid: Mid, cause: DeathCause, responsible: Responsible) -> bool {
        if self.dead.contains(&mid) {
            return false;
        }
        let Some(actor) = self.world.actor(mid) else {
            return false;
        };
        let name = actor.name().to_string();
        let was_player = actor.is_player();
        self.dead.insert(mid);

        if was_player {
            constrict::detach_all(&mut self.world, mid);
            self.say(MsgChannel::Warning, "You die...");
        } else {
            self.world.remove_actor(mid);
            self.say(MsgChannel::Combat, format!("{name} dies!"));
        }
        debug!(%mid, %cause, ?responsible, "actor died");

        self.deaths.push(DeathRecord {
            mid,
            name,
            was_player,
            cause,
            responsible,
            turn: self.turn,
        });
        true
    }

    /// Start a new combat round for everyone: shield blocks and swing
    /// counters refresh.
    pub fn begin_round(&mut self) {
        for mid in self.world.mids() {
            if let Some(actor) = self.world.actor_mut(mid) {
                actor.begin_round();
            }
        }
    }

    pub fn advance_turn(&mut self) {
        self.turn += 1;
    }
}
