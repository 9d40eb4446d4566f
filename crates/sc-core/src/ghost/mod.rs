//! Generated monster profiles
//!
//! Player ghosts, pandemonium lords, animated weapons and ugly things do not
//! come from a fixed monster table. Their numbers are rolled (or derived
//! from a player or a weapon) into a [`GhostDemon`] profile, which a
//! [`Monster`] takes ownership of through [`Monster::from_ghost`].
//!
//! Every generator clamps its output to [`GhostCaps`]; [`GhostDemon::validate`]
//! and [`debug_check_ghosts`] check that nothing slipped through.
//!
//! [`Monster`]: crate::actor::Monster
//! [`Monster::from_ghost`]: crate::actor::Monster::from_ghost
//! [`GhostCaps`]: crate::config::GhostCaps

mod generate;
mod spells;
mod ugly;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::warn;

use crate::actor::{Mid, MonsterType, Skill};
use crate::combat::{AttackFlavour, Brand, MonAttackKind};
use crate::config::CombatConfig;
use crate::consts::{MAX_GHOST_NAME, MAX_SKILL_LEVEL, MAX_XL, MIN_XL};
use crate::error::GhostError;
use crate::resist::MonResists;
use crate::world::World;

pub use generate::{
    brand_flavour, init_dancing_weapon, init_pandemonium_lord, init_player_ghost,
    init_spectral_weapon, make_name,
};
pub use spells::{
    MonSpellSlot, SEARCH_ORDER_CONJ, SEARCH_ORDER_MISC, SEARCH_ORDER_THIRD, SpellFlags, SpellType,
    build_spell_book, demon_spell_choices, ghost_spell_choices, normalize_spell_freq,
    translate_spell,
};
pub use ugly::{
    UGLY_THING_COLOURS, init_ugly_thing, ugly_thing_colour_to_flavour, ugly_thing_mutate,
    ugly_thing_upgrade,
};

/// What a profile was generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum GhostKind {
    #[strum(serialize = "player ghost")]
    PlayerGhost,
    #[strum(serialize = "pandemonium lord")]
    PandemoniumLord,
    #[strum(serialize = "dancing weapon")]
    DancingWeapon,
    #[strum(serialize = "spectral weapon")]
    SpectralWeapon,
    #[strum(serialize = "ugly thing")]
    UglyThing,
    #[strum(serialize = "very ugly thing")]
    VeryUglyThing,
}

impl GhostKind {
    /// Monster type a profile of this kind instantiates.
    pub fn monster_type(self) -> MonsterType {
        match self {
            GhostKind::PlayerGhost => MonsterType::PlayerGhost,
            GhostKind::PandemoniumLord => MonsterType::PandemoniumLord,
            GhostKind::DancingWeapon => MonsterType::DancingWeapon,
            GhostKind::SpectralWeapon => MonsterType::SpectralWeapon,
            GhostKind::UglyThing => MonsterType::UglyThing,
            GhostKind::VeryUglyThing => MonsterType::VeryUglyThing,
        }
    }

    pub fn is_ugly_thing(self) -> bool {
        matches!(self, GhostKind::UglyThing | GhostKind::VeryUglyThing)
    }
}

/// Display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum MonColour {
    #[default]
    LightGrey,
    White,
    Red,
    Brown,
    Green,
    Cyan,
    Magenta,
    Blue,
    Yellow,
}

/// A complete generated combat profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostDemon {
    pub kind: GhostKind,
    pub name: String,
    /// Species and background, only set for player ghosts
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub job: String,
    /// Experience level, used as hit dice
    pub xl: i32,
    #[serde(default)]
    pub best_skill: Option<Skill>,
    #[serde(default)]
    pub best_skill_level: i32,
    pub max_hp: i32,
    pub ev: i32,
    pub ac: i32,
    pub damage: i32,
    pub speed: i32,
    pub see_invis: bool,
    pub brand: Brand,
    pub att_type: MonAttackKind,
    pub att_flav: AttackFlavour,
    pub resists: MonResists,
    pub colour: MonColour,
    pub flies: bool,
    pub spells: Vec<MonSpellSlot>,
    pub cycle_colours: bool,
}

impl GhostDemon {
    /// A blank profile of the given kind; generators fill it in.
    pub fn new(kind: GhostKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            species: String::new(),
            job: String::new(),
            xl: MIN_XL,
            best_skill: None,
            best_skill_level: 0,
            max_hp: 1,
            ev: 0,
            ac: 0,
            damage: 1,
            speed: 10,
            see_invis: false,
            brand: Brand::Normal,
            att_type: MonAttackKind::Hit,
            att_flav: AttackFlavour::Plain,
            resists: MonResists::NONE,
            colour: MonColour::default(),
            flies: false,
            spells: Vec::new(),
            cycle_colours: false,
        }
    }

    /// Pull every numeric field inside the caps.
    pub(crate) fn clamp_to_caps(&mut self, config: &CombatConfig) {
        let caps = &config.ghost;
        self.xl = self.xl.clamp(MIN_XL, MAX_XL);
        self.max_hp = self.max_hp.clamp(1, caps.max_hp);
        self.damage = self.damage.clamp(1, caps.max_damage);
        self.ev = self.ev.clamp(0, caps.max_ev);
        self.ac = self.ac.clamp(0, caps.max_ac);
        self.speed = self.speed.clamp(caps.min_speed, caps.max_speed);
        self.best_skill_level = self.best_skill_level.clamp(0, MAX_SKILL_LEVEL);
        if !self.brand.legal_for_ghost() {
            self.brand = Brand::Normal;
        }
        if self.name.chars().count() > MAX_GHOST_NAME {
            self.name = self.name.chars().take(MAX_GHOST_NAME).collect();
        }
        if self.spells.len() > caps.max_spells {
            self.spells.truncate(caps.max_spells);
            normalize_spell_freq(&mut self.spells, config.spell_freq_total);
        }
    }

    /// Check caps and internal consistency.
    pub fn validate(&self, config: &CombatConfig) -> Result<(), GhostError> {
        let caps = &config.ghost;
        let kind = self.kind;

        if self.name.is_empty() || self.name.chars().count() > MAX_GHOST_NAME {
            return Err(GhostError::BadName {
                kind,
                name: self.name.clone(),
            });
        }

        let ranges: [(&'static str, i32, i32, i32); 7] = [
            ("xl", self.xl, MIN_XL, MAX_XL),
            ("max_hp", self.max_hp, 1, caps.max_hp),
            ("damage", self.damage, 1, caps.max_damage),
            ("ev", self.ev, 0, caps.max_ev),
            ("ac", self.ac, 0, caps.max_ac),
            ("speed", self.speed, caps.min_speed, caps.max_speed),
            ("best_skill_level", self.best_skill_level, 0, MAX_SKILL_LEVEL),
        ];
        for (field, value, min, max) in ranges {
            if !(min..=max).contains(&value) {
                return Err(GhostError::OutOfRange {
                    kind,
                    field,
                    value,
                    min,
                    max,
                });
            }
        }

        if !self.brand.legal_for_ghost() {
            return Err(GhostError::IllegalBrand {
                kind,
                brand: self.brand.to_string(),
            });
        }

        self.validate_spells(config)?;

        if kind.is_ugly_thing() {
            match ugly_thing_colour_to_flavour(self.colour) {
                Some(flav) if flav == self.att_flav => {}
                _ => {
                    return Err(GhostError::Inconsistent {
                        kind,
                        reason: format!(
                            "{} ugly thing cannot have a {} attack",
                            self.colour, self.att_flav
                        ),
                    });
                }
            }
        }
        if matches!(kind, GhostKind::DancingWeapon | GhostKind::SpectralWeapon) && !self.flies {
            return Err(GhostError::Inconsistent {
                kind,
                reason: "animated weapons must fly".to_string(),
            });
        }
        if kind != GhostKind::PlayerGhost && self.best_skill.is_some() {
            return Err(GhostError::Inconsistent {
                kind,
                reason: "only player ghosts carry skills".to_string(),
            });
        }
        Ok(())
    }

    fn validate_spells(&self, config: &CombatConfig) -> Result<(), GhostError> {
        let kind = self.kind;
        let max = config.ghost.max_spells;
        if self.spells.len() > max {
            return Err(GhostError::TooManySpells {
                kind,
                count: self.spells.len(),
                max,
            });
        }
        for (i, slot) in self.spells.iter().enumerate() {
            if !slot.spell.monster_castable() {
                return Err(GhostError::InvalidSpell {
                    kind,
                    spell: slot.spell.to_string(),
                });
            }
            if slot.freq <= 0 {
                return Err(GhostError::Inconsistent {
                    kind,
                    reason: format!("{} has no casting weight", slot.spell),
                });
            }
            if self.spells[..i].iter().any(|s| s.spell == slot.spell) {
                return Err(GhostError::Inconsistent {
                    kind,
                    reason: format!("{} appears twice", slot.spell),
                });
            }
        }
        let total: i32 = self.spells.iter().map(|s| s.freq).sum();
        if !self.spells.is_empty() && total != config.spell_freq_total {
            return Err(GhostError::Inconsistent {
                kind,
                reason: format!(
                    "spell weights sum to {total}, expected {}",
                    config.spell_freq_total
                ),
            });
        }
        Ok(())
    }
}

/// Validate every generated profile in the world.
///
/// Also checks that the owning monster's type matches the profile kind.
/// Returns the offenders; an empty list means everything is in order.
pub fn debug_check_ghosts(world: &World, config: &CombatConfig) -> Vec<(Mid, GhostError)> {
    let mut bad = Vec::new();
    for mid in world.monster_mids() {
        let Some(mon) = world.monster(mid) else {
            continue;
        };
        let Some(ghost) = mon.ghost.as_deref() else {
            continue;
        };
        let result = ghost.validate(config).and_then(|()| {
            if mon.mtype == ghost.kind.monster_type() {
                Ok(())
            } else {
                Err(GhostError::Inconsistent {
                    kind: ghost.kind,
                    reason: format!("owned by a {} monster", mon.mtype),
                })
            }
        });
        if let Err(e) = result {
            warn!(%mid, error = %e, "bad ghost profile");
            bad.push((mid, e));
        }
    }
    bad
}
