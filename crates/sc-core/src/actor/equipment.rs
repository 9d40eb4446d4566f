//! Item snapshots used by combat
//!
//! Combat only needs the numbers an item contributes, so these are plain
//! value types rather than full inventory objects.

use serde::{Deserialize, Serialize};

use super::Skill;
use crate::combat::{Brand, MissileBrand};

/// A wielded melee weapon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub skill: Skill,
    /// Base damage
    pub damage: i32,
    /// Intrinsic accuracy of the weapon type
    #[serde(default)]
    pub accuracy: i32,
    /// Enchantment
    #[serde(default)]
    pub plus: i32,
    #[serde(default)]
    pub brand: Brand,
    /// Attack reach in cells
    #[serde(default = "default_reach")]
    pub reach: i32,
}

fn default_reach() -> i32 {
    1
}

impl Weapon {
    pub fn new(name: impl Into<String>, skill: Skill, damage: i32) -> Self {
        Self {
            name: name.into(),
            skill,
            damage,
            accuracy: 0,
            plus: 0,
            brand: Brand::Normal,
            reach: 1,
        }
    }

    pub fn with_brand(mut self, brand: Brand) -> Self {
        self.brand = brand;
        self
    }

    pub fn with_plus(mut self, plus: i32) -> Self {
        self.plus = plus;
        self
    }

    pub fn with_accuracy(mut self, accuracy: i32) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_reach(mut self, reach: i32) -> Self {
        self.reach = reach;
        self
    }
}

/// A worn shield and its per-round block budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shield {
    pub name: String,
    /// Blocking strength
    pub bonus: i32,
    /// Blocks available per round
    #[serde(default = "default_block_limit")]
    pub block_limit: i32,
    /// Blocks spent this round
    #[serde(default)]
    pub blocks_used: i32,
    /// Sends blocked projectiles back
    #[serde(default)]
    pub reflective: bool,
}

fn default_block_limit() -> i32 {
    1
}

impl Shield {
    pub fn new(name: impl Into<String>, bonus: i32) -> Self {
        Self {
            name: name.into(),
            bonus,
            block_limit: 1,
            blocks_used: 0,
            reflective: false,
        }
    }

    pub fn with_block_limit(mut self, limit: i32) -> Self {
        self.block_limit = limit;
        self
    }

    pub fn reflective(mut self) -> Self {
        self.reflective = true;
        self
    }

    pub fn exhausted(&self) -> bool {
        self.blocks_used >= self.block_limit
    }

    pub fn remaining_blocks(&self) -> i32 {
        (self.block_limit - self.blocks_used).max(0)
    }

    pub fn consume_block(&mut self) {
        self.blocks_used += 1;
    }

    pub fn reset_blocks(&mut self) {
        self.blocks_used = 0;
    }
}

/// A fired or thrown projectile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missile {
    pub name: String,
    /// Skill trained by this projectile (launcher skill or throwing)
    pub skill: Skill,
    pub damage: i32,
    #[serde(default)]
    pub accuracy: i32,
    /// Launcher or ammunition enchantment
    #[serde(default)]
    pub plus: i32,
    #[serde(default)]
    pub brand: MissileBrand,
}

impl Missile {
    pub fn new(name: impl Into<String>, skill: Skill, damage: i32) -> Self {
        Self {
            name: name.into(),
            skill,
            damage,
            accuracy: 0,
            plus: 0,
            brand: MissileBrand::Normal,
        }
    }

    pub fn with_brand(mut self, brand: MissileBrand) -> Self {
        self.brand = brand;
        self
    }

    pub fn with_plus(mut self, plus: i32) -> Self {
        self.plus = plus;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_block_budget() {
        let mut s = Shield::new("buckler", 5).with_block_limit(2);
        assert!(!s.exhausted());
        s.consume_block();
        assert_eq!(s.remaining_blocks(), 1);
        s.consume_block();
        assert!(s.exhausted());
        s.reset_blocks();
        assert_eq!(s.remaining_blocks(), 2);
    }

    #[test]
    fn test_weapon_defaults_from_json() {
        let w: Weapon =
            serde_json::from_str(r#"{"name":"dagger","skill":"ShortBlades","damage":4}"#).unwrap();
        assert_eq!(w.reach, 1);
        assert_eq!(w.brand, Brand::Normal);
        assert_eq!(w.plus, 0);
    }
}
