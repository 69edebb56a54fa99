//! Infinite Combat - Combat resolution for skill uses
//!
//! Layers three bonus systems on top of a skill's direct hit:
//! - Combos: a per-actor counter with a rolling window and damage multiplier
//! - Elemental reactions: pairwise element interactions on the target
//! - Skill chains: exact element sequences that trigger an area bonus
//!
//! Health, statuses, spatial queries and presentation stay with the host and
//! are reached through the traits in [`sink`].

pub mod affliction;
pub mod arena;
pub mod chain;
pub mod combo;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod event;
pub mod reaction;
pub mod sink;
pub mod skill;
pub mod status;

pub use affliction::{AfflictionStore, ElementalAffliction};
pub use arena::{Arena, Combatant, DamageRecord, FeedbackCue};
pub use chain::{default_chains, ChainMatcher, ChainOutcome, ChainRegistry, SkillChainDefinition};
pub use combo::{ComboState, ComboTracker, HISTORY_CAPACITY};
pub use config::{CombatConfig, CombatRules};
pub use element::{DamageType, ElementPair};
pub use engine::{CombatEngine, SkillUseOutcome};
pub use error::{CombatError, DefinitionError, RulesError};
pub use event::CombatEvent;
pub use reaction::{
    default_reactions, ElementalReaction, ReactionEntry, ReactionOutcome, ReactionResolver,
    ReactionTable,
};
pub use sink::{
    AreaBuffer, AreaQuery, CombatEnv, DamageKind, DamageSink, FeedbackSink, NotificationCategory,
    NotificationSink, SkillCatalog, StatusEffectSink, MAX_AREA_TARGETS,
};
pub use skill::{SkillId, SkillUse, SkillUseRecord};
pub use status::{StatusEffect, StatusEffectType, StatusManager, StatusTick};
