//! Error types
//!
//! Only precondition violations are errors. Misses, blocks, failed escapes
//! and resisted effects are ordinary outcomes and never surface here.

use thiserror::Error;

use crate::actor::Mid;
use crate::ghost::GhostKind;

/// Rejected engine request. Returned before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("no actor with id {0}")]
    ActorNotFound(Mid),

    #[error("actor {0} is already dead")]
    ActorDead(Mid),

    #[error("actor {0} is not a monster")]
    NotAMonster(Mid),

    #[error("monster {0} is not an ugly thing")]
    NotUglyThing(Mid),

    #[error("attack has already been resolved")]
    AttackAlreadyResolved,

    #[error("monster {mid} has no attack in slot {index}")]
    NoSuchAttack { mid: Mid, index: usize },

    #[error("actor {0} cannot constrict itself")]
    SelfConstriction(Mid),

    #[error("actor {victim} is already held by {by}")]
    AlreadyConstricted { victim: Mid, by: Mid },

    #[error("actor {victim} is already holding {constrictor}")]
    MutualConstriction { constrictor: Mid, victim: Mid },

    #[error("actor {0} is not constricted")]
    NotConstricted(Mid),

    #[error("actor {constrictor} is not constricting {victim}")]
    NotConstricting { constrictor: Mid, victim: Mid },

    #[error("actor {constrictor} cannot constrict {victim}")]
    CannotConstrict { constrictor: Mid, victim: Mid },
}

/// Result alias for engine operations.
pub type CombatResult<T> = Result<T, CombatError>;

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A generated monster profile violates a cap or consistency rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GhostError {
    #[error("{kind}: {field} = {value} outside {min}..={max}")]
    OutOfRange {
        kind: GhostKind,
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("{kind}: brand {brand} is not permitted")]
    IllegalBrand { kind: GhostKind, brand: String },

    #[error("{kind}: name '{name}' is empty or too long")]
    BadName { kind: GhostKind, name: String },

    #[error("{kind}: {count} spell slots exceed the limit of {max}")]
    TooManySpells {
        kind: GhostKind,
        count: usize,
        max: usize,
    },

    #[error("{kind}: spell {spell} cannot be cast by monsters")]
    InvalidSpell { kind: GhostKind, spell: String },

    #[error("{kind}: {reason}")]
    Inconsistent { kind: GhostKind, reason: String },
}
