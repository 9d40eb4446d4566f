//! The player character

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::{
    Actor, Attitude, BodySize, EffectSource, Holiness, KillCategory, Mid, PropValue, Props, Shield,
    Weapon,
};
use crate::constrict::{ConstrictType, ConstrictionState};
use crate::consts::{BASELINE_DELAY, MAX_SKILL_LEVEL, MAX_XL, MIN_XL, NORMAL_SPEED};
use crate::ghost::SpellType;
use crate::resist::{MonResists, resistance_effect_bonus};
use crate::world::Coord;

/// Trainable skills
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Skill {
    Fighting,
    ShortBlades,
    LongBlades,
    Axes,
    MacesFlails,
    Polearms,
    Staves,
    Unarmed,
    Bows,
    Crossbows,
    Slings,
    Throwing,
    Armour,
    Dodging,
    Shields,
    Spellcasting,
    Conjurations,
    Hexes,
    Summonings,
    Necromancy,
    Translocations,
    Transmutations,
    FireMagic,
    IceMagic,
    AirMagic,
    EarthMagic,
    PoisonMagic,
    Invocations,
    Evocations,
}

impl Skill {
    /// Skills that govern a melee weapon or unarmed combat.
    pub fn is_melee(self) -> bool {
        matches!(
            self,
            Skill::ShortBlades
                | Skill::LongBlades
                | Skill::Axes
                | Skill::MacesFlails
                | Skill::Polearms
                | Skill::Staves
                | Skill::Unarmed
        )
    }
}

/// Timed player statuses
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum PlayerDuration {
    Haste,
    Might,
    Slow,
    Confusion,
    Paralysis,
    Sleep,
    Petrifying,
    Petrified,
    Resistance,
    Corrosion,
    Weak,
    Constricted,
    Invisibility,
}

impl PlayerDuration {
    /// Line shown when the status wears off.
    pub fn expiry_message(self) -> &'static str {
        match self {
            PlayerDuration::Haste => "You feel yourself slow down.",
            PlayerDuration::Might => "You feel a little less mighty now.",
            PlayerDuration::Slow => "You feel yourself speed up.",
            PlayerDuration::Confusion => "You feel less confused.",
            PlayerDuration::Paralysis => "You can move again.",
            PlayerDuration::Sleep => "You wake up.",
            PlayerDuration::Petrifying => "You turn to stone.",
            PlayerDuration::Petrified => "You feel limber!",
            PlayerDuration::Resistance => "Your resistance to elements expires.",
            PlayerDuration::Corrosion => "You are no longer corroded.",
            PlayerDuration::Weak => "Your strength returns.",
            PlayerDuration::Constricted => "You are no longer held.",
            PlayerDuration::Invisibility => "You flicker back into view.",
        }
    }
}

/// Cap for accumulated status durations.
const MAX_STATUS_DURATION: i32 = 100 * BASELINE_DELAY;
/// Corrosion stacks this deep.
const MAX_CORROSION: i32 = 4;
/// AC lost per corrosion level.
const AC_PER_CORROSION: i32 = 4;
const MAX_POISON: i32 = 100;

fn aura_source_key(d: PlayerDuration) -> String {
    format!("aura_source_{d}")
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub species: String,
    pub job: String,
    pub pos: Coord,
    pub hp: i32,
    pub max_hp: i32,
    pub xl: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub base_ac: i32,
    pub base_ev: i32,
    /// Guaranteed damage reduction of worn body armour, in percent
    pub gdr: i32,
    pub base_speed: i32,
    pub skills: BTreeMap<Skill, i32>,
    pub weapon: Option<Weapon>,
    pub shield: Option<Shield>,
    /// Flat damage bonus from rings and the like
    pub slaying: i32,
    pub intrinsic_resists: MonResists,
    pub equipment_resists: MonResists,
    pub reflect: bool,
    pub repel_missiles: bool,
    pub see_invis: bool,
    pub spells: Vec<SpellType>,
    pub durations: BTreeMap<PlayerDuration, i32>,
    /// Accumulated poison; drains one HP per point over time
    pub poison_level: i32,
    /// Negative energy levels
    pub drained: i32,
    pub corrosion: i32,
    /// Also records which aura last set a status, for removal when out of range
    pub props: Props,
    pub constriction: ConstrictionState,
    #[serde(skip)]
    swings: i32,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            species: "Human".to_string(),
            job: "Fighter".to_string(),
            pos: Coord::new(0, 0),
            hp: 20,
            max_hp: 20,
            xl: 1,
            strength: 10,
            dexterity: 10,
            intelligence: 10,
            base_ac: 0,
            base_ev: 10,
            gdr: 0,
            base_speed: NORMAL_SPEED,
            skills: BTreeMap::new(),
            weapon: None,
            shield: None,
            slaying: 0,
            intrinsic_resists: MonResists::NONE,
            equipment_resists: MonResists::NONE,
            reflect: false,
            repel_missiles: false,
            see_invis: false,
            spells: Vec::new(),
            durations: BTreeMap::new(),
            poison_level: 0,
            drained: 0,
            corrosion: 0,
            props: Props::new(),
            constriction: ConstrictionState::default(),
            swings: 0,
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    pub fn with_stats(mut self, strength: i32, dexterity: i32, intelligence: i32) -> Self {
        self.strength = strength;
        self.dexterity = dexterity;
        self.intelligence = intelligence;
        self
    }

    pub fn with_xl(mut self, xl: i32) -> Self {
        self.xl = xl.clamp(MIN_XL, MAX_XL);
        self
    }

    pub fn with_skill(mut self, skill: Skill, level: i32) -> Self {
        self.skills.insert(skill, level.clamp(0, MAX_SKILL_LEVEL));
        self
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_shield(mut self, shield: Shield) -> Self {
        self.shield = Some(shield);
        self
    }

    pub fn with_ac(mut self, ac: i32) -> Self {
        self.base_ac = ac;
        self
    }

    pub fn with_ev(mut self, ev: i32) -> Self {
        self.base_ev = ev;
        self
    }

    pub fn with_gdr(mut self, gdr: i32) -> Self {
        self.gdr = gdr;
        self
    }

    pub fn with_resists(mut self, resists: MonResists) -> Self {
        self.intrinsic_resists = resists;
        self
    }

    pub fn with_equipment_resists(mut self, resists: MonResists) -> Self {
        self.equipment_resists = resists;
        self
    }

    pub fn with_spells(mut self, spells: Vec<SpellType>) -> Self {
        self.spells = spells;
        self
    }

    pub fn with_species(mut self, species: impl Into<String>, job: impl Into<String>) -> Self {
        self.species = species.into();
        self.job = job.into();
        self
    }

    pub fn with_slaying(mut self, slaying: i32) -> Self {
        self.slaying = slaying;
        self
    }

    pub fn with_reflection(mut self) -> Self {
        self.reflect = true;
        self
    }

    pub fn at(mut self, pos: Coord) -> Self {
        self.pos = pos;
        self
    }

    pub fn skill(&self, skill: Skill) -> i32 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }

    /// Highest trained skill, ties broken by skill order.
    pub fn best_skill(&self) -> Option<(Skill, i32)> {
        self.skills
            .iter()
            .filter(|(_, lvl)| **lvl > 0)
            .fold(None, |best: Option<(Skill, i32)>, (&s, &l)| match best {
                Some((_, bl)) if bl >= l => best,
                _ => Some((s, l)),
            })
    }

    pub fn duration(&self, d: PlayerDuration) -> i32 {
        self.durations.get(&d).copied().unwrap_or(0)
    }

    pub fn has_duration(&self, d: PlayerDuration) -> bool {
        self.duration(d) > 0
    }

    /// Set a status to exactly `value`; zero or less clears it.
    pub fn set_duration(&mut self, d: PlayerDuration, value: i32) {
        if value <= 0 {
            self.durations.remove(&d);
            self.props.erase(&aura_source_key(d));
        } else {
            self.durations.insert(d, value.min(MAX_STATUS_DURATION));
        }
    }

    /// Add to a status, capped.
    pub fn increase_duration(&mut self, d: PlayerDuration, amount: i32) {
        let cur = self.duration(d);
        self.set_duration(d, cur + amount.max(0));
    }

    pub fn clear_duration(&mut self, d: PlayerDuration) -> bool {
        self.props.erase(&aura_source_key(d));
        self.durations.remove(&d).is_some()
    }

    pub fn aura_source(&self, d: PlayerDuration) -> Option<Mid> {
        self.props.get_mid(&aura_source_key(d))
    }

    pub fn set_aura_source(&mut self, d: PlayerDuration, source: Mid) {
        self.props.set(aura_source_key(d), PropValue::Actor(source));
    }

    /// Hold a status for exactly `value` on behalf of an aura.
    ///
    /// Statuses backed by a level get at least one level; refreshing never
    /// adds another.
    pub fn grant_aura_duration(&mut self, d: PlayerDuration, value: i32, source: Mid) {
        self.set_duration(d, value);
        self.set_aura_source(d, source);
        if d == PlayerDuration::Corrosion {
            self.corrosion = self.corrosion.max(1);
        }
    }

    /// Drop a status an aura granted, undoing it as if it had run out.
    pub fn revoke_aura_duration(&mut self, d: PlayerDuration) -> bool {
        if !self.clear_duration(d) {
            return false;
        }
        self.on_duration_expired(d);
        true
    }

    /// Run all status timers down by `elapsed`. Returns the statuses that
    /// ran out, in order.
    pub fn tick_durations(&mut self, elapsed: i32) -> Vec<PlayerDuration> {
        let mut expired = Vec::new();
        for (d, left) in self.durations.iter_mut() {
            *left -= elapsed;
            if *left <= 0 {
                expired.push(*d);
            }
        }
        for d in &expired {
            self.clear_duration(*d);
            self.on_duration_expired(*d);
        }
        expired
    }

    fn on_duration_expired(&mut self, d: PlayerDuration) {
        match d {
            PlayerDuration::Petrifying => {
                self.set_duration(PlayerDuration::Petrified, 5 * BASELINE_DELAY);
            }
            PlayerDuration::Corrosion => self.corrosion = 0,
            _ => {}
        }
    }
}

impl Actor for Player {
    fn mid(&self) -> Mid {
        Mid::PLAYER
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_player(&self) -> bool {
        true
    }

    fn pos(&self) -> Coord {
        self.pos
    }

    fn set_pos(&mut self, pos: Coord) {
        self.pos = pos;
    }

    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.max_hp
    }

    fn hurt(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp - amount.max(0)).max(0);
        before - self.hp
    }

    fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    fn speed(&self) -> i32 {
        let mut speed = self.base_speed;
        if self.has_duration(PlayerDuration::Haste) {
            speed = speed * 3 / 2;
        }
        if self.has_duration(PlayerDuration::Slow) {
            speed = speed * 2 / 3;
        }
        speed.max(1)
    }

    fn experience_level(&self) -> i32 {
        self.xl
    }

    fn armour_class(&self) -> i32 {
        (self.base_ac - self.corrosion * AC_PER_CORROSION).max(0)
    }

    fn evasion(&self) -> i32 {
        if self.cannot_act() { 0 } else { self.base_ev.max(0) }
    }

    fn gdr_percent(&self) -> i32 {
        self.gdr
    }

    fn shield(&self) -> Option<&Shield> {
        self.shield.as_ref()
    }

    fn shield_mut(&mut self) -> Option<&mut Shield> {
        self.shield.as_mut()
    }

    fn reflection(&self) -> bool {
        self.reflect
    }

    fn missile_repulsion(&self) -> bool {
        self.repel_missiles
    }

    fn see_invisible(&self) -> bool {
        self.see_invis
    }

    fn resists(&self) -> MonResists {
        let mut r = self.intrinsic_resists | self.equipment_resists;
        if self.has_duration(PlayerDuration::Resistance) {
            r |= resistance_effect_bonus();
        }
        r
    }

    fn asleep(&self) -> bool {
        self.has_duration(PlayerDuration::Sleep)
    }

    fn confused(&self) -> bool {
        self.has_duration(PlayerDuration::Confusion)
    }

    fn paralysed(&self) -> bool {
        self.has_duration(PlayerDuration::Paralysis)
    }

    fn petrified(&self) -> bool {
        self.has_duration(PlayerDuration::Petrified)
    }

    fn fleeing(&self) -> bool {
        false
    }

    fn invisible(&self) -> bool {
        self.has_duration(PlayerDuration::Invisibility)
    }

    fn slowed(&self) -> bool {
        self.has_duration(PlayerDuration::Slow)
    }

    fn holiness(&self) -> Holiness {
        Holiness::Natural
    }

    fn is_firewood(&self) -> bool {
        false
    }

    fn body_size(&self) -> BodySize {
        BodySize::Medium
    }

    fn attitude(&self) -> Attitude {
        Attitude::Friendly
    }

    fn kill_category(&self) -> KillCategory {
        KillCategory::You
    }

    fn poison(&mut self, _source: EffectSource, amount: i32) -> bool {
        if amount <= 0 || self.res_poison() > 0 {
            return false;
        }
        self.poison_level = (self.poison_level + amount).min(MAX_POISON);
        true
    }

    fn slow_down(&mut self, _source: EffectSource, duration: i32) -> bool {
        if duration <= 0 {
            return false;
        }
        self.increase_duration(PlayerDuration::Slow, duration);
        true
    }

    fn confuse(&mut self, _source: EffectSource, duration: i32) -> bool {
        if duration <= 0 {
            return false;
        }
        self.increase_duration(PlayerDuration::Confusion, duration);
        true
    }

    fn paralyse(&mut self, _source: EffectSource, duration: i32) -> bool {
        // no chain paralysis
        if duration <= 0 || self.paralysed() {
            return false;
        }
        self.set_duration(PlayerDuration::Paralysis, duration);
        true
    }

    fn drain(&mut self, _source: EffectSource, amount: i32) -> bool {
        if amount <= 0 || self.res_negative() >= 3 {
            return false;
        }
        self.drained += amount;
        true
    }

    fn corrode(&mut self, _source: EffectSource, duration: i32) -> bool {
        if self.res_acid() >= 3 {
            return false;
        }
        self.corrosion = (self.corrosion + 1).min(MAX_CORROSION);
        self.increase_duration(PlayerDuration::Corrosion, duration.max(BASELINE_DELAY));
        true
    }

    fn weaken(&mut self, _source: EffectSource, duration: i32) -> bool {
        if duration <= 0 {
            return false;
        }
        self.increase_duration(PlayerDuration::Weak, duration);
        true
    }

    fn wake_up(&mut self) {
        self.clear_duration(PlayerDuration::Sleep);
    }

    fn swings_this_round(&self) -> i32 {
        self.swings
    }

    fn note_swing(&mut self) {
        self.swings += 1;
    }

    fn begin_round(&mut self) {
        self.swings = 0;
        if let Some(s) = self.shield.as_mut() {
            s.reset_blocks();
        }
    }

    fn constriction(&self) -> &ConstrictionState {
        &self.constriction
    }

    fn constriction_mut(&mut self) -> &mut ConstrictionState {
        &mut self.constriction
    }

    fn reach_range(&self) -> i32 {
        self.weapon.as_ref().map_or(1, |w| w.reach.max(1))
    }

    fn escape_power(&self) -> i32 {
        BodySize::Medium as i32 + self.strength / 5
    }

    fn hold_strength(&self) -> i32 {
        3 + self.xl
    }

    fn constriction_damage(&self, _ctype: ConstrictType) -> i32 {
        (self.strength / 3 + self.skill(Skill::Unarmed) / 2).max(1)
    }

    fn set_constricted_status(&mut self, duration: Option<i32>) {
        match duration {
            Some(d) => self.set_duration(PlayerDuration::Constricted, d),
            None => {
                self.clear_duration(PlayerDuration::Constricted);
            }
        }
    }

    fn props(&self) -> &Props {
        &self.props
    }

    fn props_mut(&mut self) -> &mut Props {
        &mut self.props
    }
}
