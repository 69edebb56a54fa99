use std::path::PathBuf;

use infinite_core::EntityId;

use crate::element::DamageType;

/// Errors reported by collaborator sinks while applying an effect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CombatError {
    /// The handle no longer refers to a live entity (removed between query and apply).
    #[error("target {0} is no longer valid")]
    InvalidTarget(EntityId),
}

/// Reasons a reaction or chain definition is rejected at load time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("definition has an empty name")]
    EmptyName,

    #[error("reaction '{0}' pairs {1} with itself")]
    SelfReaction(String, DamageType),

    #[error("reaction '{name}' duplicates the {a}/{b} pair already defined by '{existing}'")]
    DuplicateReaction {
        name: String,
        existing: String,
        a: DamageType,
        b: DamageType,
    },

    #[error("'{0}' has an invalid damage multiplier {1}")]
    InvalidMultiplier(String, f32),

    #[error("'{0}' has a status chance {1} outside 0.0..=1.0")]
    InvalidChance(String, f32),

    #[error("'{0}' has a negative or non-finite radius or duration")]
    InvalidExtent(String),

    #[error("chain '{0}' has {1} steps, fewer than the minimum of {2}")]
    ChainTooShort(String, usize, usize),

    #[error("chain '{0}' has {1} steps, more than the history can hold ({2})")]
    ChainTooLong(String, usize, usize),
}

/// Errors loading combat rules from disk or text.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("failed to read combat rules '{0}': {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse combat rules: {0}")]
    Parse(#[from] toml::de::Error),
}
