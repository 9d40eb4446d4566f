//! Engine tunables
//!
//! Everything here has a sensible default and can be overridden from JSON.
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::constrict::ConstrictType;
use crate::consts::LOS_RADIUS;
use crate::error::ConfigError;

/// Direction repeated struggling pushes a victim's escape odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum EscapeTrend {
    /// Each failed attempt makes the next one likelier to succeed
    Easier,
    /// Struggling tires the victim out
    Harder,
    /// Attempts do not matter
    Flat,
}

/// Attempt multiplier when struggling gets harder: first attempt uses this,
/// each later one one less, never below one.
const HARDER_START: i32 = 4;
/// Constant multiplier for attempt-independent holds.
const FLAT_FACTOR: i32 = 3;

impl EscapeTrend {
    /// Multiplier applied to the victim's escape power on attempt `attempts`
    /// (counting from one).
    pub fn factor(self, attempts: i32) -> i32 {
        let attempts = attempts.max(1);
        match self {
            EscapeTrend::Easier => attempts,
            EscapeTrend::Harder => (HARDER_START - attempts + 1).max(1),
            EscapeTrend::Flat => FLAT_FACTOR,
        }
    }
}

/// How escaping one kind of hold is rolled.
///
/// The victim escapes when `escape_power * trend.factor(attempts)` beats
/// `hold_bonus + 1d(hold_die) + 1d(constrictor hold strength)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeRule {
    pub trend: EscapeTrend,
    pub hold_bonus: i32,
    pub hold_die: i32,
}

impl EscapeRule {
    pub const fn new(trend: EscapeTrend, hold_bonus: i32, hold_die: i32) -> Self {
        Self {
            trend,
            hold_bonus,
            hold_die,
        }
    }
}

/// Escape rules per constriction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscapeRules {
    pub melee: EscapeRule,
    pub entangle: EscapeRule,
    pub roots: EscapeRule,
    pub bvc: EscapeRule,
}

impl Default for EscapeRules {
    fn default() -> Self {
        Self {
            melee: EscapeRule::new(EscapeTrend::Easier, 5, 5),
            entangle: EscapeRule::new(EscapeTrend::Easier, 3, 5),
            roots: EscapeRule::new(EscapeTrend::Harder, 2, 4),
            bvc: EscapeRule::new(EscapeTrend::Flat, 2, 6),
        }
    }
}

/// Caps every generated monster profile must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostCaps {
    pub max_hp: i32,
    pub max_damage: i32,
    pub max_ev: i32,
    pub max_ac: i32,
    pub min_speed: i32,
    pub max_speed: i32,
    pub max_spells: usize,
}

impl Default for GhostCaps {
    fn default() -> Self {
        Self {
            max_hp: 400,
            max_damage: 60,
            max_ev: 60,
            max_ac: 60,
            min_speed: 6,
            max_speed: 30,
            max_spells: 6,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Radius for auras and indirect holds
    pub los_radius: i32,
    /// Percent of attacks that hit or miss regardless of the numbers
    pub auto_hit_miss_percent: i32,
    /// To-hit lost while confused
    pub confusion_to_hit_penalty: i32,
    /// To-hit lost by the player against an unseen target
    pub invisible_player_penalty: i32,
    /// Percent of to-hit a monster loses against an unseen target
    pub invisible_monster_percent: i32,
    /// Damage multiplier when stabbing a helpless target
    pub stab_helpless_multiplier: i32,
    /// Percent damage when stabbing a distracted target
    pub stab_distracted_percent: i32,
    pub escape: EscapeRules,
    pub ghost: GhostCaps,
    /// Spell frequencies of a generated caster sum to this
    pub spell_freq_total: i32,
    /// Hostile auras go quiet while their source stands in a sanctuary
    pub sanctuary_suppresses_hostile_auras: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            los_radius: LOS_RADIUS,
            auto_hit_miss_percent: 5,
            confusion_to_hit_penalty: 5,
            invisible_player_penalty: 6,
            invisible_monster_percent: 35,
            stab_helpless_multiplier: 3,
            stab_distracted_percent: 150,
            escape: EscapeRules::default(),
            ghost: GhostCaps::default(),
            spell_freq_total: 200,
            sanctuary_suppresses_hostile_auras: true,
        }
    }
}

impl CombatConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: CombatConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.los_radius < 1 {
            return Err(invalid("los_radius", "must be at least 1"));
        }
        if !(0..=100).contains(&self.auto_hit_miss_percent) {
            return Err(invalid("auto_hit_miss_percent", "must be a percentage"));
        }
        if !(0..=100).contains(&self.invisible_monster_percent) {
            return Err(invalid("invisible_monster_percent", "must be a percentage"));
        }
        if self.stab_helpless_multiplier < 1 {
            return Err(invalid("stab_helpless_multiplier", "must be at least 1"));
        }
        if self.stab_distracted_percent < 100 {
            return Err(invalid("stab_distracted_percent", "must not reduce damage"));
        }
        for (name, rule) in [
            ("escape.melee", self.escape.melee),
            ("escape.entangle", self.escape.entangle),
            ("escape.roots", self.escape.roots),
            ("escape.bvc", self.escape.bvc),
        ] {
            if rule.hold_die < 1 || rule.hold_bonus < 0 {
                return Err(invalid("escape", format!("{name} needs a positive hold roll")));
            }
        }
        let caps = &self.ghost;
        if caps.max_hp < 1 || caps.max_damage < 1 || caps.max_ev < 0 || caps.max_ac < 0 {
            return Err(invalid("ghost", "caps must be positive"));
        }
        if caps.min_speed < 1 || caps.min_speed > caps.max_speed {
            return Err(invalid("ghost", "speed range is empty"));
        }
        if self.spell_freq_total < 1 {
            return Err(invalid("spell_freq_total", "must be positive"));
        }
        Ok(())
    }

    pub fn escape_rule(&self, ctype: ConstrictType) -> EscapeRule {
        match ctype {
            ConstrictType::Melee => self.escape.melee,
            ConstrictType::Entangle => self.escape.entangle,
            ConstrictType::Roots => self.escape.roots,
            ConstrictType::Bvc => self.escape.bvc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(CombatConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg = CombatConfig::from_json(r#"{"los_radius": 4, "escape": {"roots": {"trend": "Easier", "hold_bonus": 1, "hold_die": 2}}}"#)
            .unwrap();
        assert_eq!(cfg.los_radius, 4);
        assert_eq!(cfg.auto_hit_miss_percent, 5);
        assert_eq!(cfg.escape_rule(ConstrictType::Roots).trend, EscapeTrend::Easier);
        assert_eq!(cfg.escape_rule(ConstrictType::Melee).trend, EscapeTrend::Easier);
        assert_eq!(cfg.escape_rule(ConstrictType::Bvc).trend, EscapeTrend::Flat);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CombatConfig::from_json(r#"{"los_radius": 0}"#),
            Err(ConfigError::Invalid { field: "los_radius", .. })
        ));
        assert!(matches!(
            CombatConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_round_trip_json() {
        let cfg = CombatConfig::default();
        let text = cfg.to_json().unwrap();
        assert_eq!(CombatConfig::from_json(&text).unwrap(), cfg);
    }

    #[test]
    fn test_escape_trend_factors() {
        assert_eq!(EscapeTrend::Easier.factor(1), 1);
        assert_eq!(EscapeTrend::Easier.factor(3), 3);
        assert_eq!(EscapeTrend::Harder.factor(1), 4);
        assert_eq!(EscapeTrend::Harder.factor(3), 2);
        assert_eq!(EscapeTrend::Harder.factor(10), 1);
        assert_eq!(EscapeTrend::Flat.factor(1), EscapeTrend::Flat.factor(7));
    }
}
