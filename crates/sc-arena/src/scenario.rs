//! Scenario files: who fights whom, under which rules.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use sc_core::actor::{MonAttack, MonsterType, Shield, Skill, Weapon};
use sc_core::ghost::{UGLY_THING_COLOURS, init_pandemonium_lord, init_ugly_thing};
use sc_core::{CombatConfig, CombatError, ConfigError, Coord, GameRng, Mid, Monster, Player, World};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Combat(#[from] CombatError),
    #[error("both sides of a duel cannot be the player")]
    TwoPlayers,
    #[error("no ugly thing colour at index {0}")]
    BadColour(usize),
}

/// A duel as read from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    pub attacker: ActorSpec,
    pub defender: ActorSpec,
    #[serde(default)]
    pub config: Option<CombatConfig>,
}

fn default_rounds() -> u32 {
    20
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let scenario: Scenario = serde_json::from_str(&text)?;
        if let Some(config) = &scenario.config {
            config.validate()?;
        }
        if scenario.attacker.is_player() && scenario.defender.is_player() {
            return Err(ScenarioError::TwoPlayers);
        }
        Ok(scenario)
    }

    pub fn config(&self) -> CombatConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// One combatant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorSpec {
    Player(PlayerSpec),
    Monster(MonsterSpec),
    PandemoniumLord,
    UglyThing {
        #[serde(default)]
        very: bool,
        /// Index into the ugly thing colour table
        #[serde(default)]
        colour: Option<usize>,
    },
}

impl ActorSpec {
    pub fn is_player(&self) -> bool {
        matches!(self, ActorSpec::Player(_))
    }

    /// Put the combatant into the world at `pos`.
    pub fn spawn(
        &self,
        world: &mut World,
        rng: &mut GameRng,
        config: &CombatConfig,
        pos: Coord,
    ) -> Result<Mid, ScenarioError> {
        let mid = match self {
            ActorSpec::Player(spec) => world.set_player(spec.build().at(pos)),
            ActorSpec::Monster(spec) => world.add_monster(spec.build().at(pos)),
            ActorSpec::PandemoniumLord => {
                let lord = init_pandemonium_lord(rng, config);
                world.add_monster(Monster::from_ghost(lord).at(pos))
            }
            ActorSpec::UglyThing { very, colour } => {
                let colour = match colour {
                    Some(i) => Some(*UGLY_THING_COLOURS.get(*i).ok_or(ScenarioError::BadColour(*i))?),
                    None => None,
                };
                let ugly = init_ugly_thing(rng, *very, colour, config);
                world.add_monster(Monster::from_ghost(ugly).at(pos))
            }
        };
        Ok(mid)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSpec {
    #[serde(default = "default_player_name")]
    pub name: String,
    pub hp: i32,
    #[serde(default = "default_xl")]
    pub xl: i32,
    #[serde(default = "default_stat")]
    pub strength: i32,
    #[serde(default = "default_stat")]
    pub dexterity: i32,
    #[serde(default)]
    pub ac: i32,
    #[serde(default)]
    pub ev: i32,
    #[serde(default)]
    pub skills: BTreeMap<Skill, i32>,
    #[serde(default)]
    pub weapon: Option<Weapon>,
    #[serde(default)]
    pub shield: Option<Shield>,
}

fn default_player_name() -> String {
    "Hero".to_string()
}

fn default_xl() -> i32 {
    1
}

fn default_stat() -> i32 {
    10
}

impl PlayerSpec {
    fn build(&self) -> Player {
        let mut p = Player::new(self.name.clone())
            .with_hp(self.hp)
            .with_xl(self.xl)
            .with_stats(self.strength, self.dexterity, 10)
            .with_ac(self.ac)
            .with_ev(self.ev);
        for (&skill, &level) in &self.skills {
            p = p.with_skill(skill, level);
        }
        if let Some(weapon) = &self.weapon {
            p = p.with_weapon(weapon.clone());
        }
        if let Some(shield) = &self.shield {
            p = p.with_shield(shield.clone());
        }
        p
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonsterSpec {
    pub name: String,
    #[serde(default)]
    pub mtype: MonsterType,
    pub hp: i32,
    #[serde(default = "default_xl")]
    pub hd: i32,
    #[serde(default)]
    pub ac: i32,
    #[serde(default)]
    pub ev: i32,
    #[serde(default)]
    pub attacks: Vec<MonAttack>,
    #[serde(default)]
    pub shield: Option<Shield>,
}

impl MonsterSpec {
    fn build(&self) -> Monster {
        let mut m = Monster::new(self.mtype, self.name.clone())
            .with_hp(self.hp)
            .with_hd(self.hd)
            .with_ac(self.ac)
            .with_ev(self.ev);
        if !self.attacks.is_empty() {
            m = m.with_attacks(self.attacks.clone());
        }
        if let Some(shield) = &self.shield {
            m = m.with_shield(shield.clone());
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_duel() {
        let text = r#"{
            "attacker": { "kind": "player", "hp": 30,
                          "weapon": { "name": "mace", "skill": "MacesFlails", "damage": 8 } },
            "defender": { "kind": "monster", "name": "orc", "hp": 12,
                          "attacks": [ { "kind": "Hit", "damage": 5 } ] }
        }"#;
        let scenario: Scenario = serde_json::from_str(text).unwrap();
        assert_eq!(scenario.rounds, 20);
        assert!(scenario.attacker.is_player());
        assert!(scenario.config.is_none());
    }

    #[test]
    fn test_spawn_generated_monsters() {
        let mut world = World::new();
        let mut rng = GameRng::new(3);
        let config = CombatConfig::default();
        let spec = ActorSpec::UglyThing {
            very: true,
            colour: Some(0),
        };
        let mid = spec.spawn(&mut world, &mut rng, &config, Coord::new(1, 0)).unwrap();
        let m = world.monster(mid).unwrap();
        assert_eq!(m.mtype, MonsterType::VeryUglyThing);

        let bad = ActorSpec::UglyThing {
            very: false,
            colour: Some(99),
        };
        assert!(matches!(
            bad.spawn(&mut world, &mut rng, &config, Coord::new(2, 0)),
            Err(ScenarioError::BadColour(99))
        ));
    }
}
