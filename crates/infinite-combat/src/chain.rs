//! Skill chains
//!
//! A chain is an exact, consecutive sequence of damage types in an actor's
//! recent history, each step following the previous within the combo window.
//! Matching a chain fires a large area bonus and consumes the history.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use infinite_core::{Color, EntityId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::combo::HISTORY_CAPACITY;
use crate::element::DamageType;
use crate::error::DefinitionError;
use crate::event::CombatEvent;
use crate::reaction::{AREA_DAMAGE_FRACTION, STATUS_MAGNITUDE_FRACTION};
use crate::sink::{
    damage_area, AreaBuffer, AreaQuery, DamageKind, DamageSink, FeedbackSink, NotificationCategory,
    NotificationSink, StatusEffectSink,
};
use crate::skill::SkillUseRecord;
use crate::status::StatusEffectType;

/// Shortest history that can complete a chain
pub const MIN_CHAIN_LENGTH: usize = 3;

const CHAIN_SHAKE: f32 = 0.6;
const CHAIN_FLASH_INTENSITY: f32 = 0.7;
const CHAIN_FLASH_DURATION: f32 = 0.4;

/// A chain definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillChainDefinition {
    pub name: String,
    /// Required damage types, oldest first
    pub sequence: Vec<DamageType>,
    pub bonus_damage_multiplier: f32,
    #[serde(default)]
    pub bonus_status: Option<StatusEffectType>,
    #[serde(default)]
    pub bonus_status_duration: f32,
    #[serde(default)]
    pub bonus_aoe_radius: f32,
    /// Lower values are tried first; ties keep registration order
    #[serde(default)]
    pub priority: i32,
}

impl SkillChainDefinition {
    pub fn new(
        name: impl Into<String>,
        sequence: impl Into<Vec<DamageType>>,
        bonus_damage_multiplier: f32,
        bonus_aoe_radius: f32,
    ) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
            bonus_damage_multiplier,
            bonus_status: None,
            bonus_status_duration: 0.0,
            bonus_aoe_radius,
            priority: 0,
        }
    }

    /// Attach a status to the chain (builder pattern)
    pub fn with_status(mut self, status: StatusEffectType, duration: f32) -> Self {
        self.bonus_status = Some(status);
        self.bonus_status_duration = duration;
        self
    }

    /// Set the match priority (builder pattern)
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        let len = self.sequence.len();
        if len < MIN_CHAIN_LENGTH {
            return Err(DefinitionError::ChainTooShort(self.name.clone(), len, MIN_CHAIN_LENGTH));
        }
        if len > HISTORY_CAPACITY {
            return Err(DefinitionError::ChainTooLong(self.name.clone(), len, HISTORY_CAPACITY));
        }
        if !self.bonus_damage_multiplier.is_finite() || self.bonus_damage_multiplier < 0.0 {
            return Err(DefinitionError::InvalidMultiplier(
                self.name.clone(),
                self.bonus_damage_multiplier,
            ));
        }
        let extents_ok = [self.bonus_aoe_radius, self.bonus_status_duration]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !extents_ok {
            return Err(DefinitionError::InvalidExtent(self.name.clone()));
        }
        Ok(())
    }

    /// Whether the tail of `history` completes this chain
    pub fn matches(&self, history: &VecDeque<SkillUseRecord>, combo_window: f64) -> bool {
        let n = self.sequence.len();
        if n == 0 || history.len() < n {
            return false;
        }
        let tail = history.range(history.len() - n..);

        let types_match = tail
            .clone()
            .zip(&self.sequence)
            .all(|(record, required)| record.damage_type == *required);

        types_match
            && tail
                .clone()
                .zip(tail.skip(1))
                .all(|(prev, next)| next.timestamp - prev.timestamp <= combo_window)
    }
}

/// Validated chain definitions in match order
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<Arc<SkillChainDefinition>>,
}

impl ChainRegistry {
    /// Build from definitions, skipping (and logging) malformed ones
    pub fn new(definitions: impl IntoIterator<Item = SkillChainDefinition>) -> Self {
        let mut chains: Vec<Arc<SkillChainDefinition>> = definitions
            .into_iter()
            .filter_map(|def| match def.validate() {
                Ok(()) => Some(Arc::new(def)),
                Err(e) => {
                    warn!("Skipping chain definition: {}", e);
                    None
                }
            })
            .collect();

        // Stable: equal priorities keep registration order
        chains.sort_by_key(|c| c.priority);
        Self { chains }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SkillChainDefinition>> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Built-in chain set
pub fn default_chains() -> Vec<SkillChainDefinition> {
    use DamageType::*;
    use StatusEffectType as S;

    vec![
        SkillChainDefinition::new("Inferno Cascade", [Fire, Fire, Fire], 2.0, 5.0)
            .with_status(S::Burn, 8.0),
        SkillChainDefinition::new("Glacial Prison", [Ice, Ice, Ice], 1.8, 4.0)
            .with_status(S::Freeze, 3.0),
        SkillChainDefinition::new("Thunderstrike", [Lightning, Lightning, Lightning], 1.9, 4.5)
            .with_status(S::Stun, 2.0),
        SkillChainDefinition::new("Plague Spreader", [Poison, Poison, Poison], 1.7, 5.0)
            .with_status(S::Poison, 10.0),
        SkillChainDefinition::new("Elemental Convergence", [Fire, Ice, Lightning], 2.5, 6.0)
            .with_status(S::Weaken, 5.0),
        SkillChainDefinition::new(
            "Blade Dance",
            [Physical, Physical, Physical, Physical],
            1.6,
            3.0,
        ),
        SkillChainDefinition::new("Twilight Judgment", [Holy, Dark, Holy, Dark, Holy], 3.5, 7.0)
            .with_status(S::Blind, 4.0)
            .with_priority(-10),
    ]
}

/// What applying a chain bonus did
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub chain: Arc<SkillChainDefinition>,
    pub chain_damage: f32,
    pub targets_hit: usize,
    pub targets_skipped: usize,
    pub statuses_applied: usize,
}

/// Matches actor histories against the registry and applies chain bonuses
#[derive(Debug, Clone)]
pub struct ChainMatcher {
    registry: ChainRegistry,
    combo_window: f64,
}

impl ChainMatcher {
    pub fn new(registry: ChainRegistry, combo_window: f64) -> Self {
        Self {
            registry,
            combo_window,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// First chain (in priority order) completed by the tail of `history`
    pub fn check_chain(
        &self,
        history: &VecDeque<SkillUseRecord>,
    ) -> Option<Arc<SkillChainDefinition>> {
        if history.len() < MIN_CHAIN_LENGTH {
            return None;
        }
        self.registry
            .iter()
            .find(|chain| chain.matches(history, self.combo_window))
            .cloned()
    }

    /// Apply a chain's bonus around `position`. The caller clears the actor's history.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_chain_bonus<E>(
        &self,
        chain: &Arc<SkillChainDefinition>,
        base_damage: f32,
        position: Vec3,
        attacker: EntityId,
        env: &mut E,
        scratch: &mut AreaBuffer,
        events: &mut Vec<CombatEvent>,
    ) -> ChainOutcome
    where
        E: DamageSink + StatusEffectSink + AreaQuery + FeedbackSink + NotificationSink + ?Sized,
    {
        let chain_damage = base_damage * chain.bonus_damage_multiplier;
        let hits = damage_area(
            env,
            scratch,
            position,
            chain.bonus_aoe_radius,
            chain_damage * AREA_DAMAGE_FRACTION,
            DamageKind::True,
            attacker,
        );

        let mut statuses_applied = 0;
        if let Some(status) = chain.bonus_status {
            let magnitude = base_damage * STATUS_MAGNITUDE_FRACTION;
            for &target in scratch.iter() {
                if env
                    .apply_status(target, status, magnitude, chain.bonus_status_duration)
                    .is_ok()
                {
                    statuses_applied += 1;
                }
            }
        }

        env.shake(CHAIN_SHAKE);
        env.flash(Color::GOLD, CHAIN_FLASH_INTENSITY, CHAIN_FLASH_DURATION);
        env.show(&format!("{} Chain!", chain.name), NotificationCategory::Chain);

        info!(
            "{} completed {} ({:.1} bonus, {} hit)",
            attacker, chain.name, chain_damage, hits.hit
        );
        events.push(CombatEvent::ChainCompleted {
            actor: attacker,
            chain: Arc::clone(chain),
        });

        ChainOutcome {
            chain: Arc::clone(chain),
            chain_damage,
            targets_hit: hits.hit,
            targets_skipped: hits.skipped,
            statuses_applied,
        }
    }
}
