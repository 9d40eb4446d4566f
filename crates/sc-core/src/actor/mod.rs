//! Actors: the player and monsters
//!
//! Combat, auras and constriction only ever talk to an actor through the
//! [`Actor`] capability trait. The world stores actors as [`Creature`], a
//! two-variant enum that dereferences to `dyn Actor`.

mod equipment;
mod monster;
mod player;
mod props;

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::constrict::{ConstrictType, ConstrictionState};
use crate::resist::{MonResists, ResistChannel};
use crate::world::Coord;

pub use equipment::{Missile, Shield, Weapon};
pub use monster::{MonAttack, Monster, MonsterFlags, MonsterType};
pub use player::{Player, PlayerDuration, Skill};
pub use props::{PropValue, Props};

/// Monster id.
///
/// Ids are handed out by the world and never reused within a session, so a
/// stale id simply fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Mid(pub u32);

impl Mid {
    /// No actor
    pub const NONE: Mid = Mid(0);
    /// Reserved id of the player
    pub const PLAYER: Mid = Mid(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Mid::NONE
    }

    pub fn is_player(self) -> bool {
        self == Mid::PLAYER
    }
}

impl fmt::Display for Mid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Mid::NONE => write!(f, "none"),
            Mid::PLAYER => write!(f, "player"),
            Mid(n) => write!(f, "#{n}"),
        }
    }
}

/// Disposition toward the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum Attitude {
    #[default]
    Hostile,
    Neutral,
    Friendly,
}

/// Who gets credit for what an actor does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, Display)]
pub enum KillCategory {
    #[default]
    Other,
    Friendly,
    You,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum Holiness {
    #[default]
    Natural,
    Undead,
    Demonic,
    Holy,
    Nonliving,
    Plant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, Display, EnumIter)]
#[repr(u8)]
pub enum BodySize {
    Tiny = 0,
    Little = 1,
    Small = 2,
    #[default]
    Medium = 3,
    Large = 4,
    Big = 5,
    Giant = 6,
}

/// Origin of a status effect, for merge and kill attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectSource {
    pub mid: Mid,
    pub who: KillCategory,
}

impl EffectSource {
    pub const NONE: EffectSource = EffectSource {
        mid: Mid::NONE,
        who: KillCategory::Other,
    };

    pub fn of(actor: &dyn Actor) -> Self {
        Self {
            mid: actor.mid(),
            who: actor.kill_category(),
        }
    }
}

/// Capability surface shared by the player and monsters.
pub trait Actor {
    // --- identity ---
    fn mid(&self) -> Mid;
    fn name(&self) -> &str;
    fn is_player(&self) -> bool;
    fn pos(&self) -> Coord;
    fn set_pos(&mut self, pos: Coord);

    // --- vitals ---
    fn hp(&self) -> i32;
    fn max_hp(&self) -> i32;
    fn alive(&self) -> bool {
        self.hp() > 0
    }
    /// Remove up to `amount` HP. Returns the HP actually lost.
    fn hurt(&mut self, amount: i32) -> i32;
    /// Restore up to `amount` HP. Returns the HP actually gained.
    fn heal(&mut self, amount: i32) -> i32;
    fn speed(&self) -> i32;
    /// Experience level for the player, hit dice for monsters.
    fn experience_level(&self) -> i32;

    // --- defence ---
    fn armour_class(&self) -> i32;
    fn evasion(&self) -> i32;
    /// Guaranteed damage reduction, in percent of incoming damage.
    fn gdr_percent(&self) -> i32;
    fn shield(&self) -> Option<&Shield>;
    fn shield_mut(&mut self) -> Option<&mut Shield>;
    fn reflection(&self) -> bool;
    fn missile_repulsion(&self) -> bool;
    fn see_invisible(&self) -> bool;

    // --- resistances ---
    fn resists(&self) -> MonResists;
    fn res_fire(&self) -> i32 {
        self.resists().level(ResistChannel::Fire)
    }
    fn res_cold(&self) -> i32 {
        self.resists().level(ResistChannel::Cold)
    }
    fn res_elec(&self) -> i32 {
        self.resists().level(ResistChannel::Elec)
    }
    fn res_poison(&self) -> i32 {
        self.resists().level(ResistChannel::Poison)
    }
    fn res_negative(&self) -> i32 {
        self.resists().level(ResistChannel::Negative)
    }
    fn res_acid(&self) -> i32 {
        self.resists().level(ResistChannel::Acid)
    }
    fn res_petrify(&self) -> i32 {
        self.resists().level(ResistChannel::Petrification)
    }
    fn res_constrict(&self) -> i32 {
        self.resists().level(ResistChannel::Constriction)
    }

    // --- status ---
    fn asleep(&self) -> bool;
    fn confused(&self) -> bool;
    fn paralysed(&self) -> bool;
    fn petrified(&self) -> bool;
    fn fleeing(&self) -> bool;
    fn invisible(&self) -> bool;
    fn slowed(&self) -> bool;
    fn cannot_act(&self) -> bool {
        self.asleep() || self.paralysed() || self.petrified()
    }
    fn incapacitated(&self) -> bool {
        self.cannot_act() || self.confused()
    }
    fn holiness(&self) -> Holiness;
    fn undead_or_demonic(&self) -> bool {
        matches!(self.holiness(), Holiness::Undead | Holiness::Demonic)
    }
    fn holy_wrath_susceptible(&self) -> bool {
        self.undead_or_demonic()
    }
    /// Whether the actor has blood to drain or a life to sap.
    fn is_living(&self) -> bool {
        matches!(self.holiness(), Holiness::Natural | Holiness::Holy)
    }
    /// Inert scenery-like monsters (plants, fungi) that most effects skip.
    fn is_firewood(&self) -> bool;
    fn body_size(&self) -> BodySize;
    fn attitude(&self) -> Attitude;
    fn kill_category(&self) -> KillCategory;

    // --- mutators; each returns whether the effect took hold ---
    fn poison(&mut self, source: EffectSource, amount: i32) -> bool;
    fn slow_down(&mut self, source: EffectSource, duration: i32) -> bool;
    fn confuse(&mut self, source: EffectSource, duration: i32) -> bool;
    fn paralyse(&mut self, source: EffectSource, duration: i32) -> bool;
    fn drain(&mut self, source: EffectSource, amount: i32) -> bool;
    fn corrode(&mut self, source: EffectSource, duration: i32) -> bool;
    fn weaken(&mut self, source: EffectSource, duration: i32) -> bool;
    fn wake_up(&mut self);

    // --- per-round bookkeeping ---
    fn swings_this_round(&self) -> i32;
    fn note_swing(&mut self);
    /// Refresh shield blocks and swing counters at the start of a round.
    fn begin_round(&mut self);

    // --- constriction ---
    fn constriction(&self) -> &ConstrictionState;
    fn constriction_mut(&mut self) -> &mut ConstrictionState;
    fn reach_range(&self) -> i32 {
        1
    }
    /// Strength of a victim's struggle.
    fn escape_power(&self) -> i32;
    /// How hard this actor is to break free from.
    fn hold_strength(&self) -> i32;
    fn constriction_damage(&self, ctype: ConstrictType) -> i32;
    /// Mark or unmark the held status effect on this actor.
    fn set_constricted_status(&mut self, duration: Option<i32>);

    // --- open-ended properties ---
    fn props(&self) -> &Props;
    fn props_mut(&mut self) -> &mut Props;
}

/// An actor stored in the world.
#[derive(Debug, Clone)]
pub enum Creature {
    Player(Box<Player>),
    Monster(Box<Monster>),
}

impl Creature {
    pub fn as_monster(&self) -> Option<&Monster> {
        match self {
            Creature::Monster(m) => Some(m),
            Creature::Player(_) => None,
        }
    }

    pub fn as_monster_mut(&mut self) -> Option<&mut Monster> {
        match self {
            Creature::Monster(m) => Some(m),
            Creature::Player(_) => None,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Creature::Player(p) => Some(p),
            Creature::Monster(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Creature::Player(p) => Some(p),
            Creature::Monster(_) => None,
        }
    }
}

impl From<Monster> for Creature {
    fn from(m: Monster) -> Self {
        Creature::Monster(Box::new(m))
    }
}

impl From<Player> for Creature {
    fn from(p: Player) -> Self {
        Creature::Player(Box::new(p))
    }
}

impl Deref for Creature {
    type Target = dyn Actor;

    fn deref(&self) -> &(dyn Actor + 'static) {
        match self {
            Creature::Player(p) => &**p,
            Creature::Monster(m) => &**m,
        }
    }
}

impl DerefMut for Creature {
    fn deref_mut(&mut self) -> &mut (dyn Actor + 'static) {
        match self {
            Creature::Player(p) => &mut **p,
            Creature::Monster(m) => &mut **m,
        }
    }
}

/// Whether two dispositions are on the same side.
///
/// The player counts as friendly. Neutrals are allied only with neutrals.
pub fn mons_aligned(a: Attitude, b: Attitude) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_display() {
        assert_eq!(Mid(7).to_string(), "#7");
        assert_eq!(Mid::PLAYER.to_string(), "player");
        assert_eq!(Mid::NONE.to_string(), "none");
        assert!(Mid::NONE.is_none());
        assert!(Mid::PLAYER.is_player());
    }

    #[test]
    fn test_kill_category_order() {
        assert!(KillCategory::You > KillCategory::Friendly);
        assert!(KillCategory::Friendly > KillCategory::Other);
    }

    #[test]
    fn test_creature_dispatch() {
        let mut c: Creature = Monster::new(MonsterType::Generic, "rat").with_hp(5).into();
        assert!(!c.is_player());
        assert_eq!(c.hp(), 5);
        assert_eq!(c.hurt(3), 3);
        assert_eq!(c.hp(), 2);
        assert_eq!(c.hurt(10), 2);
        assert!(!c.alive());
        assert!(c.as_monster().is_some());
        assert!(c.as_player().is_none());

        let p: Creature = Player::new("Hero").into();
        assert!(p.is_player());
        assert_eq!(p.mid(), Mid::PLAYER);
        assert_eq!(p.kill_category(), KillCategory::You);
    }
}
