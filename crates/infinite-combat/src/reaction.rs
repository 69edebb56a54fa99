//! Elemental reactions
//!
//! When an attack's element differs from the element a target already
//! carries, the pair is looked up in a symmetric table. A hit on the table
//! adds bonus area damage, a chance-based status and cosmetic feedback on top
//! of the attack the caller already resolved.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use infinite_core::{Color, EntityId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::affliction::AfflictionStore;
use crate::element::{DamageType, ElementPair};
use crate::error::DefinitionError;
use crate::event::CombatEvent;
use crate::sink::{
    damage_area, AreaBuffer, AreaQuery, DamageKind, DamageSink, FeedbackSink, NotificationCategory,
    NotificationSink, StatusEffectSink,
};
use crate::status::{StatusEffectType, ELEMENTAL_STATUSES, NEGATIVE_STATUSES};

/// Share of bonus damage dealt to each entity caught in an area
pub const AREA_DAMAGE_FRACTION: f32 = 0.5;
/// Status magnitude as a share of the triggering hit's base damage
pub const STATUS_MAGNITUDE_FRACTION: f32 = 0.05;

const REACTION_SHAKE: f32 = 0.3;
const REACTION_FLASH_INTENSITY: f32 = 0.4;
const REACTION_FLASH_DURATION: f32 = 0.2;

/// A reaction definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementalReaction {
    pub name: String,
    pub damage_multiplier: f32,
    #[serde(default)]
    pub aoe_radius: f32,
    #[serde(default)]
    pub applied_status: Option<StatusEffectType>,
    #[serde(default)]
    pub status_duration: f32,
    #[serde(default)]
    pub status_chance: f32,
    /// Protects the target instead of damaging the area
    #[serde(default)]
    pub is_defensive: bool,
    #[serde(default)]
    pub is_true_damage: bool,
    #[serde(default)]
    pub removes_debuffs: bool,
    #[serde(default)]
    pub cosmetic_color: Color,
}

impl ElementalReaction {
    /// Damaging reaction with an area burst
    pub fn offensive(
        name: impl Into<String>,
        damage_multiplier: f32,
        aoe_radius: f32,
        color: Color,
    ) -> Self {
        Self {
            name: name.into(),
            damage_multiplier,
            aoe_radius,
            applied_status: None,
            status_duration: 0.0,
            status_chance: 0.0,
            is_defensive: false,
            is_true_damage: false,
            removes_debuffs: false,
            cosmetic_color: color,
        }
    }

    /// Protective reaction that never damages the area
    pub fn defensive(name: impl Into<String>, color: Color) -> Self {
        Self {
            is_defensive: true,
            ..Self::offensive(name, 1.0, 0.0, color)
        }
    }

    /// Attach a chance-based status (builder pattern)
    pub fn with_status(mut self, status: StatusEffectType, duration: f32, chance: f32) -> Self {
        self.applied_status = Some(status);
        self.status_duration = duration;
        self.status_chance = chance;
        self
    }

    /// Area damage bypasses mitigation (builder pattern)
    pub fn true_damage(mut self) -> Self {
        self.is_true_damage = true;
        self
    }

    /// Strip debuffs from the target (builder pattern)
    pub fn cleansing(mut self) -> Self {
        self.removes_debuffs = true;
        self
    }

    pub fn damage_kind(&self) -> DamageKind {
        if self.is_true_damage {
            DamageKind::True
        } else {
            DamageKind::Magical
        }
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if !self.damage_multiplier.is_finite() || self.damage_multiplier < 0.0 {
            return Err(DefinitionError::InvalidMultiplier(
                self.name.clone(),
                self.damage_multiplier,
            ));
        }
        if !(0.0..=1.0).contains(&self.status_chance) {
            return Err(DefinitionError::InvalidChance(self.name.clone(), self.status_chance));
        }
        let extents_ok = [self.aoe_radius, self.status_duration]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !extents_ok {
            return Err(DefinitionError::InvalidExtent(self.name.clone()));
        }
        Ok(())
    }
}

/// A reaction bound to the pair of elements that triggers it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEntry {
    pub elements: (DamageType, DamageType),
    pub reaction: ElementalReaction,
}

impl ReactionEntry {
    pub fn new(a: DamageType, b: DamageType, reaction: ElementalReaction) -> Self {
        Self {
            elements: (a, b),
            reaction,
        }
    }
}

/// Symmetric lookup from an element pair to its reaction
#[derive(Debug, Clone, Default)]
pub struct ReactionTable {
    reactions: HashMap<ElementPair, Arc<ElementalReaction>>,
}

impl ReactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries, skipping (and logging) any that fail validation
    pub fn from_entries(entries: impl IntoIterator<Item = ReactionEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            if let Err(e) = table.insert(entry) {
                warn!("Skipping reaction definition: {}", e);
            }
        }
        table
    }

    /// Add one reaction. The first definition for a pair wins.
    pub fn insert(&mut self, entry: ReactionEntry) -> Result<(), DefinitionError> {
        let (a, b) = entry.elements;
        let pair = ElementPair::new(a, b);
        if pair.is_self_pair() {
            return Err(DefinitionError::SelfReaction(entry.reaction.name, a));
        }
        entry.reaction.validate()?;
        if let Some(existing) = self.reactions.get(&pair) {
            return Err(DefinitionError::DuplicateReaction {
                name: entry.reaction.name,
                existing: existing.name.clone(),
                a: pair.first(),
                b: pair.second(),
            });
        }
        self.reactions.insert(pair, Arc::new(entry.reaction));
        Ok(())
    }

    /// Reaction for a pair, in either order
    pub fn get(&self, a: DamageType, b: DamageType) -> Option<&Arc<ElementalReaction>> {
        self.reactions.get(&ElementPair::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

/// Built-in reaction set
pub fn default_reactions() -> Vec<ReactionEntry> {
    use DamageType::*;
    use StatusEffectType as S;

    vec![
        ReactionEntry::new(
            Fire,
            Ice,
            ElementalReaction::offensive("Thermal Shock", 2.0, 3.0, Color::rgb(0.6, 0.85, 1.0))
                .with_status(S::Slow, 3.0, 0.8),
        ),
        ReactionEntry::new(
            Fire,
            Lightning,
            ElementalReaction::offensive("Overload", 1.8, 4.0, Color::rgb(1.0, 0.6, 0.2))
                .with_status(S::Stun, 1.0, 0.3),
        ),
        ReactionEntry::new(
            Fire,
            Poison,
            ElementalReaction::offensive("Toxic Blaze", 1.5, 3.5, Color::rgb(0.7, 0.9, 0.2))
                .with_status(S::Weaken, 4.0, 0.5),
        ),
        ReactionEntry::new(
            Ice,
            Lightning,
            ElementalReaction::offensive("Superconduct", 1.6, 3.0, Color::rgb(0.7, 0.6, 1.0))
                .with_status(S::Weaken, 5.0, 0.6),
        ),
        ReactionEntry::new(
            Ice,
            Poison,
            ElementalReaction::offensive("Brittle Toxin", 1.4, 2.5, Color::rgb(0.4, 0.9, 0.7))
                .with_status(S::Freeze, 2.0, 0.4),
        ),
        ReactionEntry::new(
            Lightning,
            Poison,
            ElementalReaction::offensive("Neurotoxin", 1.5, 2.5, Color::rgb(0.6, 1.0, 0.3))
                .with_status(S::Stun, 1.5, 0.5),
        ),
        ReactionEntry::new(
            Dark,
            Holy,
            ElementalReaction::offensive("Eclipse", 2.5, 4.0, Color::rgb(0.5, 0.3, 0.7))
                .true_damage(),
        ),
        ReactionEntry::new(
            Holy,
            Poison,
            ElementalReaction::defensive("Purification", Color::rgb(1.0, 1.0, 0.8))
                .cleansing()
                .with_status(S::Regen, 5.0, 1.0),
        ),
        ReactionEntry::new(
            Holy,
            Ice,
            ElementalReaction::defensive("Aegis", Color::rgb(0.8, 0.95, 1.0))
                .cleansing()
                .with_status(S::Shield, 4.0, 1.0),
        ),
        ReactionEntry::new(
            Fire,
            Holy,
            ElementalReaction::offensive("Sacred Flame", 1.7, 3.0, Color::rgb(1.0, 0.9, 0.5))
                .with_status(S::Blind, 2.0, 0.5),
        ),
        ReactionEntry::new(
            Dark,
            Poison,
            ElementalReaction::offensive("Blight", 1.8, 3.0, Color::rgb(0.3, 0.5, 0.2))
                .with_status(S::Weaken, 6.0, 0.7),
        ),
        ReactionEntry::new(
            Dark,
            Ice,
            ElementalReaction::offensive("Void Frost", 1.6, 3.0, Color::rgb(0.3, 0.3, 0.6))
                .with_status(S::Slow, 4.0, 0.6),
        ),
        ReactionEntry::new(
            Physical,
            Ice,
            ElementalReaction::offensive("Shatter", 1.5, 2.0, Color::rgb(0.9, 0.95, 1.0))
                .with_status(S::Stun, 0.5, 0.25),
        ),
    ]
}

/// What executing a reaction did
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionOutcome {
    pub reaction: Arc<ElementalReaction>,
    /// Bonus damage before the area share is taken
    pub reaction_damage: f32,
    pub targets_hit: usize,
    pub targets_skipped: usize,
    pub status_applied: bool,
    pub debuffs_removed: usize,
}

/// Looks up and applies reactions; owns the extended-element auras
#[derive(Debug, Clone)]
pub struct ReactionResolver {
    table: ReactionTable,
    auras: AfflictionStore,
    global_scalar: f32,
}

impl ReactionResolver {
    pub fn new(table: ReactionTable, global_scalar: f32) -> Self {
        Self {
            table,
            auras: AfflictionStore::new(),
            global_scalar,
        }
    }

    pub fn table(&self) -> &ReactionTable {
        &self.table
    }

    pub fn auras(&self) -> &AfflictionStore {
        &self.auras
    }

    /// Element on a target that `incoming` could react with: a standard status
    /// first, then a live aura.
    ///
    /// The direct hit may already have applied `incoming`'s own status, so
    /// statuses of that element are passed over.
    pub fn current_element<S>(
        &mut self,
        target: EntityId,
        incoming: DamageType,
        now: f64,
        status: &S,
    ) -> Option<DamageType>
    where
        S: StatusEffectSink + ?Sized,
    {
        ELEMENTAL_STATUSES
            .iter()
            .filter_map(|s| s.element().map(|element| (*s, element)))
            .find(|(s, element)| *element != incoming && status.has_status(target, *s))
            .map(|(_, element)| element)
            .or_else(|| self.auras.current(target, now))
    }

    /// Reaction between the target's current element and `incoming`, if any
    pub fn check_reaction<S>(
        &mut self,
        incoming: DamageType,
        target: EntityId,
        now: f64,
        status: &S,
    ) -> Option<Arc<ElementalReaction>>
    where
        S: StatusEffectSink + ?Sized,
    {
        let existing = self.current_element(target, incoming, now, status)?;
        if existing == incoming {
            return None;
        }
        let reaction = self.table.get(existing, incoming);
        if reaction.is_none() {
            debug!("No reaction for {}/{}", existing, incoming);
        }
        reaction.cloned()
    }

    /// Apply a reaction's bonus effects. The primary hit itself is not repeated.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_reaction<E, R>(
        &self,
        reaction: &Arc<ElementalReaction>,
        base_damage: f32,
        position: Vec3,
        attacker: EntityId,
        target: EntityId,
        env: &mut E,
        rng: &mut R,
        scratch: &mut AreaBuffer,
        events: &mut Vec<CombatEvent>,
    ) -> ReactionOutcome
    where
        E: DamageSink + StatusEffectSink + AreaQuery + FeedbackSink + NotificationSink + ?Sized,
        R: Rng + ?Sized,
    {
        let reaction_damage = base_damage * reaction.damage_multiplier * self.global_scalar;
        let mut outcome = ReactionOutcome {
            reaction: Arc::clone(reaction),
            reaction_damage,
            targets_hit: 0,
            targets_skipped: 0,
            status_applied: false,
            debuffs_removed: 0,
        };

        if reaction.is_defensive {
            if reaction.removes_debuffs {
                outcome.debuffs_removed = cleanse(env, target);
            }
        } else {
            let hits = damage_area(
                env,
                scratch,
                position,
                reaction.aoe_radius,
                reaction_damage * AREA_DAMAGE_FRACTION,
                reaction.damage_kind(),
                attacker,
            );
            outcome.targets_hit = hits.hit;
            outcome.targets_skipped = hits.skipped;
        }

        if let Some(status) = reaction.applied_status {
            if rng.gen::<f32>() < reaction.status_chance {
                let magnitude = base_damage * STATUS_MAGNITUDE_FRACTION;
                match env.apply_status(target, status, magnitude, reaction.status_duration) {
                    Ok(()) => outcome.status_applied = true,
                    Err(e) => debug!("{} from {} not applied: {}", status.name(), reaction.name, e),
                }
            }
        }

        env.shake(REACTION_SHAKE);
        env.flash(
            reaction.cosmetic_color,
            REACTION_FLASH_INTENSITY,
            REACTION_FLASH_DURATION,
        );
        env.show(&format!("{}!", reaction.name), NotificationCategory::Reaction);

        info!(
            "{} triggered {} ({:.1} bonus, {} hit)",
            attacker, reaction.name, reaction_damage, outcome.targets_hit
        );
        events.push(CombatEvent::ElementalReactionTriggered {
            actor: attacker,
            reaction: Arc::clone(reaction),
        });
        outcome
    }

    /// Tag a target with an extended element. Standard elements are carried
    /// by their status instead and are ignored here.
    pub fn apply_elemental_aura(
        &mut self,
        target: EntityId,
        element: DamageType,
        now: f64,
        duration: f32,
    ) -> bool {
        if !element.is_extended() {
            return false;
        }
        self.auras.apply(target, element, now, duration);
        true
    }

    pub fn clear_elemental_aura(&mut self, target: EntityId) -> bool {
        self.auras.clear(target)
    }

    /// Drop expired auras
    pub fn prune(&mut self, now: f64) -> usize {
        self.auras.prune(now)
    }
}

/// Strip every negative status from a target. Returns how many were present.
fn cleanse<E>(env: &mut E, target: EntityId) -> usize
where
    E: StatusEffectSink + ?Sized,
{
    let mut removed = 0;
    for status in NEGATIVE_STATUSES {
        if !env.has_status(target, status) {
            continue;
        }
        match env.remove_status(target, status) {
            Ok(()) => removed += 1,
            Err(e) => {
                debug!("Cleanse stopped: {}", e);
                break;
            }
        }
    }
    removed
}
