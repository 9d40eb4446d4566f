//! Monster instances

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::{
    Actor, Attitude, BodySize, EffectSource, Holiness, KillCategory, Mid, Props, Shield, Weapon,
};
use crate::combat::{AttackFlavour, MonAttackKind};
use crate::constrict::{ConstrictType, ConstrictionState};
use crate::consts::{BASELINE_DELAY, MIN_ENCH_DURATION, NORMAL_SPEED};
use crate::enchant::{EnchantKind, EnchantmentSet, MonEnchant};
use crate::ghost::{GhostDemon, GhostKind, MonSpellSlot};
use crate::resist::{MonResists, resistance_effect_bonus};
use crate::world::Coord;

/// Monster species the engine gives special behaviour to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter)]
pub enum MonsterType {
    /// Any monster with no special rules
    #[default]
    Generic,
    /// Slows enemies in sight
    TorporSnail,
    /// Grants resistance to allies
    Cherub,
    /// Corrodes adjacent enemies
    EntropyWeaver,
    PlayerGhost,
    PandemoniumLord,
    DancingWeapon,
    SpectralWeapon,
    UglyThing,
    VeryUglyThing,
    /// Body constrictor
    Naga,
    /// Inert plant life
    Plant,
}

bitflags! {
    /// Intrinsic monster properties
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MonsterFlags: u32 {
        const SEE_INVIS = 0x0001;
        const FLIES = 0x0002;
        /// Plants, fungi and similar scenery
        const FIREWOOD = 0x0004;
        /// Trained warrior, more accurate in melee
        const FIGHTER = 0x0008;
        const REFLECT = 0x0010;
        const REPEL_MISSILES = 0x0020;
        /// Colours shift every turn
        const CYCLE_COLOURS = 0x0040;
    }
}

impl Serialize for MonsterFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MonsterFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(MonsterFlags::from_bits_truncate(bits))
    }
}

/// One natural attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonAttack {
    pub kind: MonAttackKind,
    #[serde(default)]
    pub flavour: AttackFlavour,
    pub damage: i32,
}

impl MonAttack {
    pub fn new(kind: MonAttackKind, flavour: AttackFlavour, damage: i32) -> Self {
        Self {
            kind,
            flavour,
            damage,
        }
    }

    pub fn hit(damage: i32) -> Self {
        Self::new(MonAttackKind::Hit, AttackFlavour::Plain, damage)
    }
}

/// A live monster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub mid: Mid,
    pub mtype: MonsterType,
    pub name: String,
    pub pos: Coord,
    pub hp: i32,
    pub max_hp: i32,
    /// Hit dice
    pub hd: i32,
    pub base_ac: i32,
    pub base_ev: i32,
    pub base_speed: i32,
    pub attacks: Vec<MonAttack>,
    pub base_resists: MonResists,
    pub flags: MonsterFlags,
    pub holiness: Holiness,
    pub size: BodySize,
    pub attitude: Attitude,
    /// Attitude to restore when a charm wears off
    pub original_attitude: Option<Attitude>,
    pub enchantments: EnchantmentSet,
    pub weapon: Option<Weapon>,
    pub shield: Option<Shield>,
    /// Generated profile for ghosts, pan lords and the like
    pub ghost: Option<Box<GhostDemon>>,
    pub spells: Vec<MonSpellSlot>,
    pub props: Props,
    pub constriction: ConstrictionState,
    #[serde(skip)]
    swings: i32,
}

impl Monster {
    pub fn new(mtype: MonsterType, name: impl Into<String>) -> Self {
        Self {
            mid: Mid::NONE,
            mtype,
            name: name.into(),
            pos: Coord::new(0, 0),
            hp: 10,
            max_hp: 10,
            hd: 1,
            base_ac: 0,
            base_ev: 0,
            base_speed: NORMAL_SPEED,
            attacks: vec![MonAttack::hit(3)],
            base_resists: MonResists::NONE,
            flags: MonsterFlags::empty(),
            holiness: Holiness::Natural,
            size: BodySize::Medium,
            attitude: Attitude::Hostile,
            original_attitude: None,
            enchantments: EnchantmentSet::new(),
            weapon: None,
            shield: None,
            ghost: None,
            spells: Vec::new(),
            props: Props::new(),
            constriction: ConstrictionState::default(),
            swings: 0,
        }
    }

    /// Instantiate a monster from a generated profile, taking ownership of it.
    pub fn from_ghost(ghost: GhostDemon) -> Self {
        let mut m = Monster::new(ghost.kind.monster_type(), ghost.name.clone());
        m.hp = ghost.max_hp;
        m.max_hp = ghost.max_hp;
        m.ghost = Some(Box::new(ghost));
        m.sync_ghost();
        m
    }

    /// Copy the owned profile's numbers onto the monster.
    ///
    /// Called again after the profile changes (ugly thing recolouring or
    /// upgrade). Current HP moves by the same amount as max HP.
    pub fn sync_ghost(&mut self) {
        let Some(ghost) = self.ghost.as_deref() else {
            return;
        };
        let holiness = match ghost.kind {
            GhostKind::PlayerGhost => Holiness::Undead,
            GhostKind::PandemoniumLord => Holiness::Demonic,
            GhostKind::DancingWeapon | GhostKind::SpectralWeapon => Holiness::Nonliving,
            GhostKind::UglyThing | GhostKind::VeryUglyThing => Holiness::Natural,
        };
        let mut flags = self.flags
            - (MonsterFlags::SEE_INVIS | MonsterFlags::FLIES | MonsterFlags::CYCLE_COLOURS);
        if ghost.see_invis {
            flags |= MonsterFlags::SEE_INVIS;
        }
        if ghost.flies {
            flags |= MonsterFlags::FLIES;
        }
        if ghost.cycle_colours {
            flags |= MonsterFlags::CYCLE_COLOURS;
        }
        let gained = ghost.max_hp - self.max_hp;
        self.mtype = ghost.kind.monster_type();
        self.name = ghost.name.clone();
        self.max_hp = ghost.max_hp;
        self.hp = (self.hp + gained).clamp(1, self.max_hp);
        self.hd = ghost.xl;
        self.base_ac = ghost.ac;
        self.base_ev = ghost.ev;
        self.base_speed = ghost.speed;
        self.attacks = vec![MonAttack::new(ghost.att_type, ghost.att_flav, ghost.damage)];
        self.base_resists = ghost.resists;
        self.flags = flags;
        self.holiness = holiness;
        self.spells = ghost.spells.clone();
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    pub fn with_hd(mut self, hd: i32) -> Self {
        self.hd = hd.max(1);
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

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.base_speed = speed;
        self
    }

    pub fn with_attack(mut self, attack: MonAttack) -> Self {
        self.attacks = vec![attack];
        self
    }

    pub fn with_attacks(mut self, attacks: Vec<MonAttack>) -> Self {
        self.attacks = attacks;
        self
    }

    pub fn with_resists(mut self, resists: MonResists) -> Self {
        self.base_resists = resists;
        self
    }

    pub fn with_flags(mut self, flags: MonsterFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_holiness(mut self, holiness: Holiness) -> Self {
        self.holiness = holiness;
        self
    }

    pub fn with_size(mut self, size: BodySize) -> Self {
        self.size = size;
        self
    }

    pub fn with_attitude(mut self, attitude: Attitude) -> Self {
        self.attitude = attitude;
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

    pub fn at(mut self, pos: Coord) -> Self {
        self.pos = pos;
        self
    }

    pub fn has_ench(&self, kind: EnchantKind) -> bool {
        self.enchantments.has(kind)
    }

    pub fn get_ench(&self, kind: EnchantKind) -> Option<&MonEnchant> {
        self.enchantments.get(kind)
    }

    /// Hit dice after negative energy.
    pub fn effective_hd(&self) -> i32 {
        let drained = self
            .get_ench(EnchantKind::Drained)
            .map_or(0, |e| e.degree);
        (self.hd - drained).max(1)
    }

    /// Constriction style granted by natural attacks, if any.
    pub fn constrict_type(&self) -> Option<ConstrictType> {
        self.attacks.iter().find_map(|a| match a.flavour {
            AttackFlavour::Constrict => Some(ConstrictType::Melee),
            AttackFlavour::Entangle => Some(ConstrictType::Entangle),
            _ => None,
        })
    }

    /// Enchantments this monster cannot receive at all.
    pub fn refuses_ench(&self, kind: EnchantKind) -> bool {
        match kind {
            EnchantKind::Fear => {
                matches!(self.holiness, Holiness::Nonliving | Holiness::Plant)
                    || self.has_ench(EnchantKind::Berserk)
            }
            EnchantKind::Confusion | EnchantKind::Sleep | EnchantKind::Charm => {
                self.holiness == Holiness::Plant
            }
            EnchantKind::Petrifying | EnchantKind::Petrified => self.res_petrify() > 0,
            EnchantKind::Poison => self.res_poison() > 0,
            EnchantKind::StickyFlame => self.res_fire() >= 3,
            EnchantKind::Drained => self.res_negative() >= 3,
            EnchantKind::Corrosion => self.res_acid() >= 3,
            _ => false,
        }
    }

    /// Attach an enchantment, merging with any existing one of the same kind.
    ///
    /// The duration must already be resolved; a zero duration is bumped to
    /// the minimum. Returns false if the monster refuses the effect.
    pub fn add_ench(&mut self, mut ench: MonEnchant) -> bool {
        if self.refuses_ench(ench.kind) {
            return false;
        }
        if ench.duration <= 0 {
            ench.duration = MIN_ENCH_DURATION;
            ench.max_duration = ench.max_duration.max(ench.duration);
        }
        if let Some(existing) = self.enchantments.get_mut(ench.kind) {
            existing.merge(&ench);
            return true;
        }
        let added = ench.clone();
        self.enchantments.insert(ench);
        self.add_enchantment_effect(&added);
        true
    }

    fn add_enchantment_effect(&mut self, ench: &MonEnchant) {
        match ench.kind {
            EnchantKind::Charm => {
                if self.original_attitude.is_none() {
                    self.original_attitude = Some(self.attitude);
                }
                self.attitude = Attitude::Friendly;
            }
            EnchantKind::Berserk => {
                let source = EffectSource {
                    mid: ench.source,
                    who: ench.who,
                };
                for part in [EnchantKind::Haste, EnchantKind::Might] {
                    self.add_ench(MonEnchant::new(part, 1, source, ench.duration));
                }
                self.del_ench(EnchantKind::Fear, false);
            }
            EnchantKind::Petrified => {
                self.del_ench(EnchantKind::Petrifying, false);
            }
            _ => {}
        }
    }

    /// Detach an enchantment and run its removal side effect.
    ///
    /// `expired` distinguishes running out from being cured; some effects
    /// only progress on expiry.
    pub fn del_ench(&mut self, kind: EnchantKind, expired: bool) -> Option<MonEnchant> {
        let removed = self.enchantments.remove(kind)?;
        self.remove_enchantment_effect(&removed, expired);
        Some(removed)
    }

    fn remove_enchantment_effect(&mut self, ench: &MonEnchant, expired: bool) {
        match ench.kind {
            EnchantKind::Charm => {
                self.attitude = self.original_attitude.take().unwrap_or(Attitude::Hostile);
            }
            EnchantKind::Berserk => {
                self.del_ench(EnchantKind::Haste, false);
                self.del_ench(EnchantKind::Might, false);
            }
            EnchantKind::Petrifying if expired => {
                let source = EffectSource {
                    mid: ench.source,
                    who: ench.who,
                };
                let dur = ench.max_duration.max(5 * BASELINE_DELAY);
                self.add_ench(MonEnchant::new(EnchantKind::Petrified, 1, source, dur));
            }
            _ => {}
        }
    }

    fn add_timed(&mut self, kind: EnchantKind, degree: i32, source: EffectSource, duration: i32) -> bool {
        if duration <= 0 {
            return false;
        }
        self.add_ench(MonEnchant::new(kind, degree, source, duration))
    }
}

/// AC lost per degree of corrosion.
const AC_PER_CORROSION: i32 = 4;

impl Actor for Monster {
    fn mid(&self) -> Mid {
        self.mid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_player(&self) -> bool {
        false
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
        if self.has_ench(EnchantKind::Haste) {
            speed = speed * 3 / 2;
        }
        if self.has_ench(EnchantKind::Slow) {
            speed = speed * 2 / 3;
        }
        speed.max(1)
    }

    fn experience_level(&self) -> i32 {
        self.effective_hd()
    }

    fn armour_class(&self) -> i32 {
        let corrosion = self
            .get_ench(EnchantKind::Corrosion)
            .map_or(0, |e| e.degree);
        (self.base_ac - corrosion * AC_PER_CORROSION).max(0)
    }

    fn evasion(&self) -> i32 {
        if self.cannot_act() { 0 } else { self.base_ev.max(0) }
    }

    fn gdr_percent(&self) -> i32 {
        0
    }

    fn shield(&self) -> Option<&Shield> {
        self.shield.as_ref()
    }

    fn shield_mut(&mut self) -> Option<&mut Shield> {
        self.shield.as_mut()
    }

    fn reflection(&self) -> bool {
        self.flags.contains(MonsterFlags::REFLECT)
    }

    fn missile_repulsion(&self) -> bool {
        self.flags.contains(MonsterFlags::REPEL_MISSILES)
    }

    fn see_invisible(&self) -> bool {
        self.flags.contains(MonsterFlags::SEE_INVIS)
    }

    fn resists(&self) -> MonResists {
        let mut r = self.base_resists;
        if self.has_ench(EnchantKind::Resistance) {
            r |= resistance_effect_bonus();
        }
        r
    }

    fn asleep(&self) -> bool {
        self.has_ench(EnchantKind::Sleep)
    }

    fn confused(&self) -> bool {
        self.has_ench(EnchantKind::Confusion)
    }

    fn paralysed(&self) -> bool {
        self.has_ench(EnchantKind::Paralysis)
    }

    fn petrified(&self) -> bool {
        self.has_ench(EnchantKind::Petrified)
    }

    fn fleeing(&self) -> bool {
        self.has_ench(EnchantKind::Fear)
    }

    fn invisible(&self) -> bool {
        self.has_ench(EnchantKind::Invis)
    }

    fn slowed(&self) -> bool {
        self.has_ench(EnchantKind::Slow)
    }

    fn holiness(&self) -> Holiness {
        self.holiness
    }

    fn is_firewood(&self) -> bool {
        self.flags.contains(MonsterFlags::FIREWOOD)
    }

    fn body_size(&self) -> BodySize {
        self.size
    }

    fn attitude(&self) -> Attitude {
        self.attitude
    }

    fn kill_category(&self) -> KillCategory {
        if self.attitude == Attitude::Friendly {
            KillCategory::Friendly
        } else {
            KillCategory::Other
        }
    }

    fn poison(&mut self, source: EffectSource, amount: i32) -> bool {
        if amount <= 0 {
            return false;
        }
        // one degree per application, lasting longer for stronger doses
        self.add_ench(MonEnchant::new(
            EnchantKind::Poison,
            1,
            source,
            amount * 2 * BASELINE_DELAY,
        ))
    }

    fn slow_down(&mut self, source: EffectSource, duration: i32) -> bool {
        self.add_timed(EnchantKind::Slow, 1, source, duration)
    }

    fn confuse(&mut self, source: EffectSource, duration: i32) -> bool {
        self.add_timed(EnchantKind::Confusion, 1, source, duration)
    }

    fn paralyse(&mut self, source: EffectSource, duration: i32) -> bool {
        if self.paralysed() {
            return false;
        }
        self.add_timed(EnchantKind::Paralysis, 1, source, duration)
    }

    fn drain(&mut self, source: EffectSource, amount: i32) -> bool {
        if amount <= 0 {
            return false;
        }
        self.add_ench(MonEnchant::new(
            EnchantKind::Drained,
            amount,
            source,
            amount * 10 * BASELINE_DELAY,
        ))
    }

    fn corrode(&mut self, source: EffectSource, duration: i32) -> bool {
        self.add_timed(EnchantKind::Corrosion, 1, source, duration.max(BASELINE_DELAY))
    }

    fn weaken(&mut self, source: EffectSource, duration: i32) -> bool {
        self.add_timed(EnchantKind::Weak, 1, source, duration)
    }

    fn wake_up(&mut self) {
        self.del_ench(EnchantKind::Sleep, false);
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
        self.size as i32 + 1
    }

    fn hold_strength(&self) -> i32 {
        self.effective_hd()
    }

    fn constriction_damage(&self, ctype: ConstrictType) -> i32 {
        let from_attack = self
            .attacks
            .iter()
            .filter(|a| match ctype {
                ConstrictType::Melee => a.flavour == AttackFlavour::Constrict,
                ConstrictType::Entangle => a.flavour == AttackFlavour::Entangle,
                ConstrictType::Roots | ConstrictType::Bvc => false,
            })
            .map(|a| a.damage)
            .max();
        from_attack.unwrap_or(self.effective_hd() / 2 + 1).max(1)
    }

    fn set_constricted_status(&mut self, duration: Option<i32>) {
        match duration {
            Some(d) => {
                self.add_ench(MonEnchant::new(
                    EnchantKind::Constricted,
                    1,
                    EffectSource::NONE,
                    d,
                ));
            }
            None => {
                self.del_ench(EnchantKind::Constricted, false);
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
