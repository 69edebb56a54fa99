//! Combat engine: combos, reactions and chains for each skill use
//!
//! The skill pipeline resolves a skill's direct hit first, then hands the use
//! to [`CombatEngine::on_skill_used`]. Everything here is a bonus layered on top
//! of that hit: the combo multiplier, at most one elemental reaction and at
//! most one chain.

use infinite_core::EntityId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::chain::{ChainMatcher, ChainOutcome, ChainRegistry};
use crate::combo::ComboTracker;
use crate::config::{CombatConfig, CombatRules};
use crate::event::CombatEvent;
use crate::reaction::{ReactionOutcome, ReactionResolver, ReactionTable};
use crate::sink::{AreaBuffer, CombatEnv};
use crate::skill::SkillUse;

/// Result of one [`CombatEngine::on_skill_used`] call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillUseOutcome {
    /// False when the skill was unknown and nothing was resolved
    pub resolved: bool,
    pub combo_count: u32,
    pub combo_multiplier: f32,
    /// Direct-hit damage after the combo multiplier. Bonuses below use the
    /// unscaled base instead.
    pub scaled_damage: f32,
    pub primary_target: Option<EntityId>,
    pub reaction: Option<ReactionOutcome>,
    /// The incoming element was left on the target as an aura
    pub aura_applied: bool,
    pub chain: Option<ChainOutcome>,
}

pub struct CombatEngine {
    config: CombatConfig,
    combo: ComboTracker,
    reactions: ReactionResolver,
    chains: ChainMatcher,
    rng: StdRng,
    scratch: AreaBuffer,
    events: Vec<CombatEvent>,
}

impl CombatEngine {
    pub fn new(config: CombatConfig, table: ReactionTable, registry: ChainRegistry) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            combo: ComboTracker::new(config.clone()),
            reactions: ReactionResolver::new(table, config.global_reaction_scalar),
            chains: ChainMatcher::new(registry, config.combo_window),
            config,
            rng,
            scratch: AreaBuffer::new(),
            events: Vec::new(),
        }
    }

    /// Build from a loaded rule set (built-in tables fill empty lists)
    pub fn from_rules(rules: &CombatRules) -> Self {
        Self::new(
            rules.config.clone(),
            rules.reaction_table(),
            rules.chain_registry(),
        )
    }

    /// Resolve combo, reaction and chain bonuses for one skill use.
    ///
    /// The direct hit must already be applied by the caller. `now` is in
    /// seconds and must not go backwards between calls.
    pub fn on_skill_used<E>(
        &mut self,
        skill_use: SkillUse,
        now: f64,
        env: &mut E,
    ) -> SkillUseOutcome
    where
        E: CombatEnv + ?Sized,
    {
        let SkillUse {
            actor,
            skill,
            damage_type,
            position,
            target,
        } = skill_use;

        let Some(base_damage) = env.base_damage(skill) else {
            debug!("Unknown skill {} used by {}, ignoring", skill, actor);
            return SkillUseOutcome::default();
        };

        let combo_count = self
            .combo
            .register_use(actor, skill, damage_type, now, &mut self.events);
        let combo_multiplier = self.combo.damage_multiplier(combo_count);
        let scaled_damage = base_damage * combo_multiplier;

        let mut outcome = SkillUseOutcome {
            resolved: true,
            combo_count,
            combo_multiplier,
            scaled_damage,
            ..Default::default()
        };

        outcome.primary_target =
            target.or_else(|| env.nearest_entity(position, self.config.impact_radius, actor));

        if let Some(target) = outcome.primary_target {
            match self.reactions.check_reaction(damage_type, target, now, &*env) {
                Some(reaction) => {
                    let result = self.reactions.execute_reaction(
                        &reaction,
                        base_damage,
                        position,
                        actor,
                        target,
                        env,
                        &mut self.rng,
                        &mut self.scratch,
                        &mut self.events,
                    );
                    // The reaction consumes whatever aura it reacted with
                    self.reactions.clear_elemental_aura(target);
                    outcome.reaction = Some(result);
                }
                None => {
                    outcome.aura_applied = self.reactions.apply_elemental_aura(
                        target,
                        damage_type,
                        now,
                        self.config.aura_duration,
                    );
                }
            }
        } else {
            trace!("{} hit nothing at {}", skill, position);
        }

        let chain = self
            .combo
            .state(actor)
            .and_then(|state| self.chains.check_chain(state.history()));
        if let Some(chain) = chain {
            let result = self.chains.apply_chain_bonus(
                &chain,
                base_damage,
                position,
                actor,
                env,
                &mut self.scratch,
                &mut self.events,
            );
            self.combo.clear_history(actor);
            outcome.chain = Some(result);
        }

        outcome
    }

    /// Per-frame upkeep: expire lapsed combos and stale auras
    pub fn tick(&mut self, now: f64) {
        self.combo.tick(now, &mut self.events);
        let pruned = self.reactions.prune(now);
        if pruned > 0 {
            trace!("Pruned {} expired auras", pruned);
        }
    }

    /// Forget everything tracked for an entity that left the world
    pub fn on_entity_removed(&mut self, id: EntityId) {
        self.combo.remove_actor(id);
        self.reactions.clear_elemental_aura(id);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub fn reactions(&self) -> &ReactionResolver {
        &self.reactions
    }

    pub fn chains(&self) -> &ChainMatcher {
        &self.chains
    }
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::from_rules(&CombatRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::element::DamageType;
    use crate::sink::{DamageKind, StatusEffectSink, MAX_AREA_TARGETS};
    use crate::skill::SkillId;
    use crate::status::StatusEffectType;
    use glam::Vec3;

    const FIREBALL: SkillId = SkillId(1);
    const FROST_BOLT: SkillId = SkillId(2);
    const SMITE: SkillId = SkillId(3);
    const SHADOW_BOLT: SkillId = SkillId(4);
    const VENOM: SkillId = SkillId(6);

    fn engine() -> CombatEngine {
        let config = CombatConfig {
            rng_seed: Some(7),
            ..Default::default()
        };
        CombatEngine::from_rules(&CombatRules {
            config,
            ..Default::default()
        })
    }

    fn arena() -> Arena {
        let mut arena = Arena::new();
        arena.register_skill(FIREBALL, 20.0);
        arena.register_skill(FROST_BOLT, 20.0);
        arena.register_skill(SMITE, 10.0);
        arena.register_skill(SHADOW_BOLT, 10.0);
        arena
    }

    fn cast(actor: EntityId, skill: SkillId, element: DamageType, target: EntityId) -> SkillUse {
        SkillUse::new(actor, skill, element, Vec3::ZERO).with_target(target)
    }

    #[test]
    fn test_unknown_skill_is_a_no_op() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-10.0, 0.0, 0.0), 100.0);
        let mut engine = engine();

        let outcome = engine.on_skill_used(
            SkillUse::new(actor, SkillId(999), DamageType::Fire, Vec3::ZERO),
            0.0,
            &mut arena,
        );
        assert_eq!(outcome, SkillUseOutcome::default());
        assert_eq!(engine.combo().tracked_actors(), 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_fire_chain_scenario() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 500.0);
        let bystander = arena.spawn(Vec3::new(4.0, 0.0, 0.0), 500.0);
        let mut engine = engine();

        let fire = cast(actor, FIREBALL, DamageType::Fire, target);
        let mut last = SkillUseOutcome::default();
        for (i, t) in [0.0, 0.8, 1.6].into_iter().enumerate() {
            last = engine.on_skill_used(fire, t, &mut arena);
            assert_eq!(last.combo_count, i as u32 + 1);
            if i < 2 {
                assert!(last.chain.is_none());
            }
        }

        let chain = last.chain.expect("Inferno Cascade should fire");
        assert_eq!(chain.chain.name, "Inferno Cascade");
        // Combo 3 scales the direct hit to 22; the chain doubles the 20 base
        assert!((last.scaled_damage - 22.0).abs() < 1e-4);
        assert_eq!(chain.chain_damage, 2.0 * 20.0);
        assert_eq!(arena.health(bystander), Some(500.0 - 20.0));
        assert_eq!(chain.targets_hit, 2);
        assert!(arena.has_status(target, StatusEffectType::Burn));
        assert!(arena.has_status(bystander, StatusEffectType::Burn));
        assert!(!arena.has_status(actor, StatusEffectType::Burn));
        assert_eq!(engine.combo().history_len(actor), 0);

        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            CombatEvent::ChainCompleted { chain, .. } if chain.name == "Inferno Cascade"
        )));
    }

    #[test]
    fn test_chain_does_not_retrigger_on_next_use() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 1000.0);
        let mut engine = engine();

        let fire = cast(actor, FIREBALL, DamageType::Fire, target);
        for t in [0.0, 0.5, 1.0] {
            engine.on_skill_used(fire, t, &mut arena);
        }
        let fourth = engine.on_skill_used(fire, 1.5, &mut arena);
        assert!(fourth.chain.is_none());
        assert_eq!(engine.combo().history_len(actor), 1);
        // Combo keeps counting across the chain
        assert_eq!(fourth.combo_count, 4);
    }

    #[test]
    fn test_thermal_shock_scenario() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 100.0);
        let near = arena.spawn(Vec3::new(2.0, 0.0, 0.0), 100.0);
        arena.inflict(target, StatusEffectType::Burn, 1.0, 10.0);
        let mut engine = engine();

        let frost = cast(actor, FROST_BOLT, DamageType::Ice, target);
        let outcome = engine.on_skill_used(frost, 0.0, &mut arena);
        let reaction = outcome.reaction.expect("Thermal Shock should fire");
        assert_eq!(reaction.reaction.name, "Thermal Shock");
        assert_eq!(reaction.reaction_damage, 40.0);
        assert_eq!(reaction.targets_hit, 2);
        assert_eq!(arena.health(target), Some(80.0));
        assert_eq!(arena.health(near), Some(80.0));
        assert!(!outcome.aura_applied);
        assert_eq!(
            arena.notifications().last().map(|n| n.0.as_str()),
            Some("Thermal Shock!")
        );
    }

    #[test]
    fn test_reaction_after_host_applied_hit_status() {
        // The host lands the hit's own status before the engine sees the use
        let react = |existing: StatusEffectType, incoming: DamageType, skill: SkillId| {
            let mut arena = arena();
            arena.register_skill(VENOM, 20.0);
            let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
            let target = arena.spawn(Vec3::ZERO, 500.0);
            arena.inflict(target, existing, 1.0, 10.0);
            if let Some(status) = incoming.standard_status() {
                arena.apply_status(target, status, 2.0, 4.0).unwrap();
            }

            let mut engine = engine();
            let use_ = cast(actor, skill, incoming, target);
            let outcome = engine.on_skill_used(use_, 0.0, &mut arena);
            outcome.reaction.map(|r| r.reaction.name.clone())
        };

        let poison_on_burning = react(StatusEffectType::Burn, DamageType::Poison, VENOM);
        let fire_on_poisoned = react(StatusEffectType::Poison, DamageType::Fire, FIREBALL);
        assert_eq!(poison_on_burning.as_deref(), Some("Toxic Blaze"));
        assert_eq!(fire_on_poisoned, poison_on_burning);
    }

    #[test]
    fn test_aura_then_reaction_consumes_it() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 200.0);
        let mut engine = engine();

        let shadow = cast(actor, SHADOW_BOLT, DamageType::Dark, target);
        let smite = cast(actor, SMITE, DamageType::Holy, target);
        let first = engine.on_skill_used(shadow, 0.0, &mut arena);
        assert!(first.aura_applied);
        assert!(first.reaction.is_none());
        assert_eq!(engine.reactions().auras().len(), 1);

        let second = engine.on_skill_used(smite, 1.0, &mut arena);
        let reaction = second.reaction.expect("Eclipse should fire");
        assert_eq!(reaction.reaction.name, "Eclipse");
        assert!(engine.reactions().auras().is_empty());
        assert_eq!(arena.damage_log().last().map(|d| d.kind), Some(DamageKind::True));

        // Aura is gone, so a third hit only re-tags the target
        let third = engine.on_skill_used(shadow, 2.0, &mut arena);
        assert!(third.reaction.is_none());
        assert!(third.aura_applied);
    }

    #[test]
    fn test_standard_element_does_not_leave_aura() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 100.0);
        let mut engine = engine();

        let fire = cast(actor, FIREBALL, DamageType::Fire, target);
        let outcome = engine.on_skill_used(fire, 0.0, &mut arena);
        assert!(!outcome.aura_applied);
        assert!(engine.reactions().auras().is_empty());
    }

    #[test]
    fn test_primary_target_falls_back_to_nearest() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::ZERO, 100.0);
        let far = arena.spawn(Vec3::new(1.8, 0.0, 0.0), 100.0);
        let close = arena.spawn(Vec3::new(0.5, 0.0, 0.0), 100.0);
        let mut engine = engine();

        let outcome = engine.on_skill_used(
            SkillUse::new(actor, SMITE, DamageType::Holy, Vec3::ZERO),
            0.0,
            &mut arena,
        );
        assert_eq!(outcome.primary_target, Some(close));
        assert_ne!(outcome.primary_target, Some(far));

        let nothing = engine.on_skill_used(
            SkillUse::new(actor, SMITE, DamageType::Holy, Vec3::new(100.0, 0.0, 0.0)),
            0.5,
            &mut arena,
        );
        assert!(nothing.resolved);
        assert_eq!(nothing.primary_target, None);
        assert!(nothing.reaction.is_none());
    }

    #[test]
    fn test_reaction_and_chain_on_same_use() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 1000.0);
        let mut engine = engine();

        engine.on_skill_used(cast(actor, FIREBALL, DamageType::Fire, target), 0.0, &mut arena);
        engine.on_skill_used(cast(actor, FROST_BOLT, DamageType::Ice, target), 0.5, &mut arena);
        // Give Lightning something to react with
        arena.inflict(target, StatusEffectType::Freeze, 1.0, 5.0);
        arena.register_skill(SkillId(5), 15.0);
        let spark = cast(actor, SkillId(5), DamageType::Lightning, target);
        let third = engine.on_skill_used(spark, 1.0, &mut arena);

        let reaction = third.reaction.map(|r| r.reaction.name.clone());
        let chain = third.chain.map(|c| c.chain.name.clone());
        assert_eq!(reaction.as_deref(), Some("Superconduct"));
        assert_eq!(chain.as_deref(), Some("Elemental Convergence"));
    }

    #[test]
    fn test_area_overflow_truncates() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-50.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 1000.0);
        for i in 0..(MAX_AREA_TARGETS * 2) {
            arena.spawn(Vec3::new(0.0, 0.0, 0.01 * i as f32), 1000.0);
        }
        let mut engine = engine();

        let fire = cast(actor, FIREBALL, DamageType::Fire, target);
        let mut last = SkillUseOutcome::default();
        for t in [0.0, 0.5, 1.0] {
            last = engine.on_skill_used(fire, t, &mut arena);
        }
        let chain = last.chain.expect("chain should fire");
        assert_eq!(chain.targets_hit + chain.targets_skipped, MAX_AREA_TARGETS);
    }

    #[test]
    fn test_tick_expires_combo_and_auras() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 100.0);
        let mut engine = engine();

        engine.on_skill_used(cast(actor, SMITE, DamageType::Holy, target), 0.0, &mut arena);
        engine.drain_events();

        engine.tick(10.0);
        assert_eq!(engine.combo().current_combo(actor, 10.0), 0);
        assert!(engine.reactions().auras().is_empty());
        assert!(matches!(
            engine.drain_events().as_slice(),
            [CombatEvent::ComboUpdated { count: 0, .. }]
        ));
    }

    #[test]
    fn test_entity_removal_clears_state() {
        let mut arena = arena();
        let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
        let target = arena.spawn(Vec3::ZERO, 100.0);
        let mut engine = engine();

        engine.on_skill_used(cast(actor, SMITE, DamageType::Holy, target), 0.0, &mut arena);
        engine.on_entity_removed(actor);
        engine.on_entity_removed(target);
        assert_eq!(engine.combo().tracked_actors(), 0);
        assert!(engine.reactions().auras().is_empty());
    }

    #[test]
    fn test_same_seed_same_rolls() {
        let run = || {
            let mut arena = arena();
            let actor = arena.spawn(Vec3::new(-20.0, 0.0, 0.0), 100.0);
            let mut statuses = Vec::new();
            let mut engine = engine();
            for i in 0..10 {
                let position = Vec3::new(0.0, 0.0, 100.0 * i as f32);
                let target = arena.spawn(position, 100.0);
                arena.inflict(target, StatusEffectType::Burn, 1.0, 10.0);
                let use_ = SkillUse::new(actor, FROST_BOLT, DamageType::Ice, position)
                    .with_target(target);
                let outcome = engine.on_skill_used(use_, i as f64 * 10.0, &mut arena);
                statuses.push(outcome.reaction.map(|r| r.status_applied));
            }
            statuses
        };
        assert_eq!(run(), run());
    }
}
