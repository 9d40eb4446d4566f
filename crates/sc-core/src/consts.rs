//! Engine-wide constants

/// To-hit value that always connects, bypassing the evasion comparison.
pub const AUTOMATIC_HIT: i32 = 1500;

/// Enchantment duration treated as permanent.
pub const INFINITE_DURATION: i32 = 30000;

/// Time units in one normal-speed turn.
pub const BASELINE_DELAY: i32 = 10;

/// Speed of an ordinary actor.
pub const NORMAL_SPEED: i32 = 10;

/// Degree cap for most enchantments.
pub const MAX_ENCH_DEGREE_DEFAULT: i32 = 4;

/// Degree cap for summoning timers.
pub const MAX_ENCH_DEGREE_ABJURATION: i32 = 6;

/// Degree cap for effects that accumulate freely (sickness, drain).
pub const MAX_ENCH_DEGREE_ACCUMULATING: i32 = 50;

/// Shortest duration handed out when an enchantment is applied without one.
pub const MIN_ENCH_DURATION: i32 = 15;

/// Default line-of-sight radius.
pub const LOS_RADIUS: i32 = 7;

/// Longest name a generated ghost may carry.
pub const MAX_GHOST_NAME: usize = 20;

/// Experience level bounds.
pub const MIN_XL: i32 = 1;
pub const MAX_XL: i32 = 27;

/// Skill levels run 0..=27.
pub const MAX_SKILL_LEVEL: i32 = 27;
