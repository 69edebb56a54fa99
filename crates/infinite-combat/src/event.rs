//! Observations emitted for UI and analytics consumers

use std::sync::Arc;

use infinite_core::EntityId;

use crate::chain::SkillChainDefinition;
use crate::reaction::ElementalReaction;

/// Something the combat core resolved this step
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// Combo count changed (a count of 0 means the combo expired)
    ComboUpdated {
        actor: EntityId,
        count: u32,
        multiplier: f32,
    },
    ElementalReactionTriggered {
        actor: EntityId,
        reaction: Arc<ElementalReaction>,
    },
    ChainCompleted {
        actor: EntityId,
        chain: Arc<SkillChainDefinition>,
    },
}

impl CombatEvent {
    /// Actor that caused this event
    pub fn actor(&self) -> EntityId {
        match self {
            Self::ComboUpdated { actor, .. }
            | Self::ElementalReactionTriggered { actor, .. }
            | Self::ChainCompleted { actor, .. } => *actor,
        }
    }
}
