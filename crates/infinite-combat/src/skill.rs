//! Skill identifiers and per-use records

use glam::Vec3;
use infinite_core::EntityId;
use serde::{Deserialize, Serialize};

use crate::element::DamageType;

/// Unique skill identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillId(pub u64);

impl std::fmt::Display for SkillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skill#{}", self.0)
    }
}

/// One skill use as remembered in an actor's history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillUseRecord {
    pub skill_id: SkillId,
    pub damage_type: DamageType,
    /// Seconds
    pub timestamp: f64,
}

/// A resolved skill use handed over by the skill pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillUse {
    pub actor: EntityId,
    pub skill: SkillId,
    pub damage_type: DamageType,
    /// Impact point
    pub position: Vec3,
    /// Primary target when the pipeline already knows it; otherwise the
    /// nearest entity to `position` is used.
    pub target: Option<EntityId>,
}

impl SkillUse {
    pub fn new(actor: EntityId, skill: SkillId, damage_type: DamageType, position: Vec3) -> Self {
        Self {
            actor,
            skill,
            damage_type,
            position,
            target: None,
        }
    }

    /// Set the primary target (builder pattern)
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }
}
