//! In-memory combat host
//!
//! [`Arena`] implements every collaborator trait over a flat entity map. It
//! backs the sandbox binary and the crate's tests; real hosts plug their own
//! world, health and presentation layers into the same traits instead.

use std::collections::{BTreeMap, HashMap, HashSet};

use glam::Vec3;
use infinite_core::{Color, EntityId};

use crate::error::CombatError;
use crate::sink::{
    AreaBuffer, AreaQuery, DamageKind, DamageSink, FeedbackSink, NotificationCategory,
    NotificationSink, SkillCatalog, StatusEffectSink,
};
use crate::skill::SkillId;
use crate::status::{StatusEffect, StatusEffectType, StatusManager, StatusTick};

/// An entity standing in the arena
#[derive(Debug, Clone)]
pub struct Combatant {
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub status: StatusManager,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// One damage application, in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRecord {
    pub target: EntityId,
    pub amount: f32,
    pub kind: DamageKind,
    pub source: EntityId,
}

/// A presentation request captured instead of rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedbackCue {
    Shake(f32),
    Flash {
        color: Color,
        intensity: f32,
        duration: f32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Arena {
    // Ordered so area queries are reproducible
    combatants: BTreeMap<EntityId, Combatant>,
    skills: HashMap<SkillId, f32>,
    /// Entities that show up in queries but reject every apply
    stale: HashSet<EntityId>,
    damage_log: Vec<DamageRecord>,
    feedback: Vec<FeedbackCue>,
    notifications: Vec<(String, NotificationCategory)>,
    next_id: u128,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a combatant. IDs are sequential so runs are deterministic.
    pub fn spawn(&mut self, position: Vec3, health: f32) -> EntityId {
        self.next_id += 1;
        let id = EntityId::from_u128(self.next_id);
        self.combatants.insert(
            id,
            Combatant {
                position,
                health,
                max_health: health,
                status: StatusManager::new(),
            },
        );
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Combatant> {
        self.stale.remove(&id);
        self.combatants.remove(&id)
    }

    /// Keep reporting `id` from area queries but fail every apply, as if it
    /// was removed between the query and the apply step
    pub fn invalidate_on_apply(&mut self, id: EntityId) {
        self.stale.insert(id);
    }

    pub fn register_skill(&mut self, skill: SkillId, base_damage: f32) {
        self.skills.insert(skill, base_damage);
    }

    /// Put a status on a combatant directly (setup, not combat)
    pub fn inflict(
        &mut self,
        id: EntityId,
        status: StatusEffectType,
        magnitude: f32,
        duration: f32,
    ) {
        if let Some(c) = self.combatants.get_mut(&id) {
            c.status.apply(StatusEffect::new(status, magnitude, duration));
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn health(&self, id: EntityId) -> Option<f32> {
        self.combatants.get(&id).map(|c| c.health)
    }

    pub fn status_magnitude(&self, id: EntityId, status: StatusEffectType) -> Option<f32> {
        self.combatants
            .get(&id)
            .and_then(|c| c.status.get(status))
            .map(|e| e.magnitude)
    }

    /// Advance statuses; DOT damage and regen land on health.
    /// Returns the total tick across all combatants.
    pub fn update(&mut self, delta: f32) -> StatusTick {
        let mut total = StatusTick::default();
        for c in self.combatants.values_mut() {
            if !c.is_alive() {
                continue;
            }
            let tick = c.status.update(delta);
            c.health = (c.health - tick.damage + tick.healing).clamp(0.0, c.max_health);
            total.damage += tick.damage;
            total.healing += tick.healing;
        }
        total
    }

    pub fn damage_log(&self) -> &[DamageRecord] {
        &self.damage_log
    }

    pub fn feedback(&self) -> &[FeedbackCue] {
        &self.feedback
    }

    pub fn notifications(&self) -> &[(String, NotificationCategory)] {
        &self.notifications
    }

    fn live_mut(&mut self, id: EntityId) -> Result<&mut Combatant, CombatError> {
        if self.stale.contains(&id) {
            return Err(CombatError::InvalidTarget(id));
        }
        self.combatants
            .get_mut(&id)
            .ok_or(CombatError::InvalidTarget(id))
    }
}

impl DamageSink for Arena {
    fn apply_damage(
        &mut self,
        target: EntityId,
        amount: f32,
        kind: DamageKind,
        source: EntityId,
    ) -> Result<(), CombatError> {
        // No armor in the arena: every kind lands in full
        let combatant = self.live_mut(target)?;
        combatant.health = (combatant.health - amount).max(0.0);
        self.damage_log.push(DamageRecord {
            target,
            amount,
            kind,
            source,
        });
        Ok(())
    }
}

impl StatusEffectSink for Arena {
    fn apply_status(
        &mut self,
        target: EntityId,
        status: StatusEffectType,
        magnitude: f32,
        duration: f32,
    ) -> Result<(), CombatError> {
        let combatant = self.live_mut(target)?;
        combatant
            .status
            .apply(StatusEffect::new(status, magnitude, duration));
        Ok(())
    }

    fn remove_status(
        &mut self,
        target: EntityId,
        status: StatusEffectType,
    ) -> Result<(), CombatError> {
        self.live_mut(target)?.status.remove(status);
        Ok(())
    }

    fn has_status(&self, target: EntityId, status: StatusEffectType) -> bool {
        self.combatants
            .get(&target)
            .is_some_and(|c| c.status.has_effect(status))
    }
}

impl AreaQuery for Arena {
    fn find_entities_in_radius(&self, position: Vec3, radius: f32, out: &mut AreaBuffer) {
        let hits = self
            .combatants
            .iter()
            .filter(|(_, c)| c.is_alive() && c.position.distance(position) <= radius);
        for (id, _) in hits {
            if out.try_push(*id).is_err() {
                break;
            }
        }
    }

    fn position_of(&self, id: EntityId) -> Option<Vec3> {
        self.combatants
            .get(&id)
            .filter(|c| c.is_alive())
            .map(|c| c.position)
    }
}

impl FeedbackSink for Arena {
    fn shake(&mut self, intensity: f32) {
        self.feedback.push(FeedbackCue::Shake(intensity));
    }

    fn flash(&mut self, color: Color, intensity: f32, duration: f32) {
        self.feedback.push(FeedbackCue::Flash {
            color,
            intensity,
            duration,
        });
    }
}

impl NotificationSink for Arena {
    fn show(&mut self, message: &str, category: NotificationCategory) {
        self.notifications.push((message.to_string(), category));
    }
}

impl SkillCatalog for Arena {
    fn base_damage(&self, skill: SkillId) -> Option<f32> {
        self.skills.get(&skill).copied()
    }
}
