//! sc-core: combat resolution and actor status engine
//!
//! This crate resolves melee and ranged attacks, tracks timed status effects
//! (enchantments), maintains constriction links between actors, projects
//! passive auras and generates procedural monster profiles (player ghosts,
//! pandemonium lords, animated weapons, ugly things).
//!
//! It has no I/O dependencies. All state for one game lives in a
//! [`GameSession`], which every entry point takes by exclusive reference.

pub mod actor;
pub mod aura;
pub mod combat;
pub mod config;
pub mod constrict;
pub mod enchant;
pub mod error;
pub mod ghost;
pub mod message;
pub mod random_var;
pub mod resist;
pub mod world;

mod consts;
mod rng;
mod session;

pub use consts::*;
pub use rng::{ChaChaSource, ExtremeSource, GameRng, RandomSource, ScriptedSource};
pub use session::{DeathCause, DeathRecord, GameSession, Responsible};

pub use actor::{Actor, Creature, Mid, Monster, Player};
pub use config::CombatConfig;
pub use error::{CombatError, CombatResult, ConfigError, GhostError};
pub use world::{Coord, World};
