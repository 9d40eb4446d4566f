//! Attack resolution
//!
//! An [`Attack`] is a one-shot transaction between an attacker and a
//! defender. It runs its phases in a fixed order and stops early on a miss
//! or a block:
//!
//! ```text
//! Attempted -> Dodged? -> Blocked? -> Hit -> Damaged -> Killed? -> End
//! ```
//!
//! The per-style formulas sit behind [`AttackStrategy`]; brands and on-hit
//! effects are shared by every style.

mod ac;
mod attack;
mod brand;
mod effects;
mod strategy;

pub use ac::{AcRule, ac_damage_var, apply_ac};
pub use attack::{Attack, AttackOptions, AttackOutcome, AttackPhase, Reflection, test_hit};
pub use brand::{AttackFlavour, Brand, HitEffect, MissileBrand, MonAttackKind};
pub use strategy::{
    ArmedMelee, AttackSnapshot, AttackStrategy, MonsterMelee, RangedMissile, UnarmedMelee,
};
