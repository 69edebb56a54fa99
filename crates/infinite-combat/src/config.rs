//! Combat tunables and loadable rule sets
//!
//! [`CombatConfig`] holds the numeric knobs. [`CombatRules`] bundles the config
//! with reaction and chain definitions so designers can ship them as TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::{default_chains, ChainRegistry, SkillChainDefinition};
use crate::error::RulesError;
use crate::reaction::{default_reactions, ReactionEntry, ReactionTable};

/// Numeric tunables for combos, reactions and targeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Max gap in seconds between two uses that still continues a combo
    pub combo_window: f64,
    pub max_combo_count: u32,
    /// Damage bonus per combo stack beyond the first
    pub per_stack_bonus: f32,
    /// Cap on the total combo bonus
    pub max_combo_damage_bonus: f32,
    /// Scales every reaction's damage
    pub global_reaction_scalar: f32,
    /// Lifetime in seconds of an extended-element aura
    pub aura_duration: f32,
    /// Search radius for the primary target when the pipeline gives none
    pub impact_radius: f32,
    /// Seed for status-chance rolls; `None` seeds from entropy
    pub rng_seed: Option<u64>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            combo_window: 3.0,
            max_combo_count: 10,
            per_stack_bonus: 0.05,
            max_combo_damage_bonus: 0.5,
            global_reaction_scalar: 1.0,
            aura_duration: 6.0,
            impact_radius: 2.0,
            rng_seed: None,
        }
    }
}

impl CombatConfig {
    /// Damage multiplier for a combo count.
    ///
    /// `1.0` up to one stack, then `per_stack_bonus` per extra stack, saturating
    /// at `1.0 + max_combo_damage_bonus`.
    pub fn damage_multiplier(&self, count: u32) -> f32 {
        if count <= 1 {
            return 1.0;
        }
        let bonus = (count - 1) as f32 * self.per_stack_bonus;
        1.0 + bonus.min(self.max_combo_damage_bonus).max(0.0)
    }
}

/// Config plus reaction and chain definitions.
///
/// Empty `reactions` / `chains` lists fall back to the built-in sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    pub config: CombatConfig,
    pub reactions: Vec<ReactionEntry>,
    pub chains: Vec<SkillChainDefinition>,
}

impl CombatRules {
    /// Parse rules from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, RulesError> {
        Ok(toml::from_str(text)?)
    }

    /// Load rules from a TOML file
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let text =
            fs::read_to_string(path).map_err(|e| RulesError::Read(path.to_path_buf(), e))?;
        let rules = Self::from_toml_str(&text)?;
        info!("Loaded combat rules from {:?}", path);
        Ok(rules)
    }

    /// Build the reaction table, validating every entry
    pub fn reaction_table(&self) -> ReactionTable {
        if self.reactions.is_empty() {
            debug!("No reactions configured, using built-in table");
            return ReactionTable::from_entries(default_reactions());
        }
        ReactionTable::from_entries(self.reactions.clone())
    }

    /// Build the chain registry, validating every definition
    pub fn chain_registry(&self) -> ChainRegistry {
        if self.chains.is_empty() {
            debug!("No chains configured, using built-in registry");
            return ChainRegistry::new(default_chains());
        }
        ChainRegistry::new(self.chains.clone())
    }
}
