//! Collaborator interfaces the engine calls out to
//!
//! Health, status storage, spatial queries, presentation and skill data all
//! live outside the combat core. Each concern is its own trait so hosts can
//! implement only what they own; [`CombatEnv`] bundles them for the engine.

use arrayvec::ArrayVec;
use glam::Vec3;
use infinite_core::{Color, EntityId};
use serde::{Deserialize, Serialize};

use crate::error::CombatError;
use crate::skill::SkillId;
use crate::status::StatusEffectType;

/// Maximum entities a single area query can report
pub const MAX_AREA_TARGETS: usize = 32;

/// Reusable scratch buffer for area queries. Implementations must stop
/// (not fail) once it is full.
pub type AreaBuffer = ArrayVec<EntityId, MAX_AREA_TARGETS>;

/// How damage interacts with the target's defenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    Physical,
    Magical,
    /// Bypasses mitigation
    True,
}

/// Category for on-screen notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationCategory {
    Combo,
    Reaction,
    Chain,
}

pub trait DamageSink {
    fn apply_damage(
        &mut self,
        target: EntityId,
        amount: f32,
        kind: DamageKind,
        source: EntityId,
    ) -> Result<(), CombatError>;
}

pub trait StatusEffectSink {
    fn apply_status(
        &mut self,
        target: EntityId,
        status: StatusEffectType,
        magnitude: f32,
        duration: f32,
    ) -> Result<(), CombatError>;

    fn remove_status(
        &mut self,
        target: EntityId,
        status: StatusEffectType,
    ) -> Result<(), CombatError>;

    fn has_status(&self, target: EntityId, status: StatusEffectType) -> bool;
}

pub trait AreaQuery {
    /// Push every entity within `radius` of `position` into `out`.
    /// `out` is cleared by the caller; extra hits beyond its capacity are dropped.
    fn find_entities_in_radius(&self, position: Vec3, radius: f32, out: &mut AreaBuffer);

    /// World position of a live entity
    fn position_of(&self, id: EntityId) -> Option<Vec3>;

    /// Closest entity to `position` within `radius`, other than `exclude`.
    /// Only the first [`MAX_AREA_TARGETS`] hits of the area query are ranked.
    fn nearest_entity(&self, position: Vec3, radius: f32, exclude: EntityId) -> Option<EntityId> {
        let mut out = AreaBuffer::new();
        self.find_entities_in_radius(position, radius, &mut out);
        out.into_iter()
            .filter(|id| *id != exclude)
            .filter_map(|id| Some((id, self.position_of(id)?.distance(position))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

pub trait FeedbackSink {
    fn shake(&mut self, intensity: f32);
    fn flash(&mut self, color: Color, intensity: f32, duration: f32);
}

pub trait NotificationSink {
    fn show(&mut self, message: &str, category: NotificationCategory);
}

/// Skill-effect data registry (owned by the skill pipeline)
pub trait SkillCatalog {
    fn base_damage(&self, skill: SkillId) -> Option<f32>;
}

/// Everything the engine needs from its host in one bound
pub trait CombatEnv:
    DamageSink + StatusEffectSink + AreaQuery + FeedbackSink + NotificationSink + SkillCatalog
{
}

impl<T> CombatEnv for T where
    T: DamageSink + StatusEffectSink + AreaQuery + FeedbackSink + NotificationSink + SkillCatalog
{
}

/// Tally from applying damage to everything an area query found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AreaHits {
    pub hit: usize,
    /// Entities that became invalid between the query and the apply step
    pub skipped: usize,
}

/// Query `radius` around `position` into `scratch` and damage each entity
/// other than `source`. Invalid targets are skipped; the rest of the batch
/// still lands. `scratch` is left holding the entities that were attempted.
pub(crate) fn damage_area<E>(
    env: &mut E,
    scratch: &mut AreaBuffer,
    position: Vec3,
    radius: f32,
    amount: f32,
    kind: DamageKind,
    source: EntityId,
) -> AreaHits
where
    E: DamageSink + AreaQuery + ?Sized,
{
    let mut hits = AreaHits::default();
    scratch.clear();
    if radius <= 0.0 {
        return hits;
    }
    env.find_entities_in_radius(position, radius, scratch);
    scratch.retain(|target| *target != source);

    for &target in scratch.iter() {
        match env.apply_damage(target, amount, kind, source) {
            Ok(()) => hits.hit += 1,
            Err(e) => {
                tracing::debug!("Skipping area target: {}", e);
                hits.skipped += 1;
            }
        }
    }
    hits
}
