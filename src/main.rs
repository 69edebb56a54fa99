//! Infinite Combat Sandbox - scripted fight for the combat engine
//!
//! Runs a fixed rotation against a ring of training dummies on a simulated
//! clock and logs every combo, reaction and chain the engine resolves.

mod settings;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use infinite_combat::{
    Arena, CombatEngine, CombatEvent, DamageKind, DamageSink, DamageType, SkillId, SkillUse,
    StatusEffectSink,
};
use infinite_core::{EntityId, GameTime, Vec3};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use settings::{SandboxSettings, ScenarioSettings};

/// Frame length fed to the clock; the fight is simulated, not real-time
const FRAME_DELTA: f32 = 1.0 / 30.0;

struct RotationStep {
    name: &'static str,
    skill: SkillId,
    damage_type: DamageType,
    base_damage: f32,
}

const fn step(
    name: &'static str,
    skill: u64,
    damage_type: DamageType,
    base_damage: f32,
) -> RotationStep {
    RotationStep {
        name,
        skill: SkillId(skill),
        damage_type,
        base_damage,
    }
}

const ROTATION: &[RotationStep] = &[
    step("Fireball", 1, DamageType::Fire, 20.0),
    step("Fireball", 1, DamageType::Fire, 20.0),
    step("Fireball", 1, DamageType::Fire, 20.0),
    step("Frost Bolt", 2, DamageType::Ice, 18.0),
    step("Spark", 3, DamageType::Lightning, 15.0),
    step("Shadow Bolt", 4, DamageType::Dark, 14.0),
    step("Smite", 5, DamageType::Holy, 14.0),
    step("Slash", 6, DamageType::Physical, 10.0),
    step("Slash", 6, DamageType::Physical, 10.0),
    step("Slash", 6, DamageType::Physical, 10.0),
    step("Slash", 6, DamageType::Physical, 10.0),
];

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG overrides)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to set subscriber")?;

    info!("Starting combat sandbox...");

    let settings = SandboxSettings::load();
    let rules = settings.load_rules();
    let mut engine = CombatEngine::from_rules(&rules);
    info!(
        "{} reactions, {} chains loaded",
        engine.reactions().table().len(),
        engine.chains().registry().len()
    );

    let mut arena = Arena::new();
    let player = arena.spawn(Vec3::new(0.0, 0.0, -10.0), 1000.0);
    let enemies = spawn_ring(&mut arena, &settings.scenario);
    for step in ROTATION {
        arena.register_skill(step.skill, step.base_damage);
    }

    let mut time = GameTime::new(settings.time.clone());
    let fixed_dt = time.config.fixed_timestep;
    let mut next_cast = 0.0;
    let mut rotation = ROTATION.iter().cycle();
    let mut alive = enemies.clone();

    while time.now() < settings.scenario.duration as f64 && !alive.is_empty() {
        let frame = time.advance(FRAME_DELTA);
        for _ in 0..frame.fixed_steps {
            let tick = arena.update(fixed_dt);
            if tick.damage > 0.0 || tick.healing > 0.0 {
                debug!("Status tick: {:.1} damage, {:.1} healing", tick.damage, tick.healing);
            }
        }

        let now = time.now();
        engine.tick(now);

        if let Some(&target) = alive.first().filter(|_| now >= next_cast) {
            next_cast = now + settings.scenario.cast_interval as f64;
            let step = rotation.next().context("Rotation is empty")?;
            cast(&mut engine, &mut arena, &settings.scenario, player, target, step, now)?;
        }

        for event in engine.drain_events() {
            log_event(&event);
        }

        alive.retain(|id| {
            let standing = arena.get(*id).is_some_and(|c| c.is_alive());
            if !standing {
                info!("{} defeated at {:.1}s", id, now);
                arena.despawn(*id);
                engine.on_entity_removed(*id);
            }
            standing
        });
    }

    print_summary(&arena, &enemies, time.now());
    Ok(())
}

/// Place the dummies evenly on a ring around the origin
fn spawn_ring(arena: &mut Arena, scenario: &ScenarioSettings) -> Vec<EntityId> {
    let count = scenario.enemy_count.max(1);
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * scenario.ring_radius;
            arena.spawn(position, scenario.enemy_health)
        })
        .collect()
}

/// Resolve the direct hit the way a skill pipeline would, then hand the use
/// to the engine for its bonuses
fn cast(
    engine: &mut CombatEngine,
    arena: &mut Arena,
    scenario: &ScenarioSettings,
    player: EntityId,
    target: EntityId,
    step: &RotationStep,
    now: f64,
) -> Result<()> {
    let position = arena
        .get(target)
        .map(|c| c.position)
        .context("Target vanished before the cast")?;

    let kind = if step.damage_type == DamageType::Physical {
        DamageKind::Physical
    } else {
        DamageKind::Magical
    };
    arena.apply_damage(target, step.base_damage, kind, player)?;
    if let Some(status) = step.damage_type.standard_status() {
        let magnitude = step.base_damage * 0.1;
        arena.apply_status(target, status, magnitude, scenario.hit_status_duration)?;
    }

    let skill_use =
        SkillUse::new(player, step.skill, step.damage_type, position).with_target(target);
    let outcome = engine.on_skill_used(skill_use, now, arena);
    debug!(
        "{} -> {} (combo {}, x{:.2})",
        step.name, target, outcome.combo_count, outcome.combo_multiplier
    );
    Ok(())
}

fn log_event(event: &CombatEvent) {
    match event {
        CombatEvent::ComboUpdated { actor, count, multiplier } => {
            if *count == 0 {
                info!("{} combo dropped", actor);
            } else if *count > 1 {
                info!("{} combo x{} ({:.2} damage)", actor, count, multiplier);
            }
        }
        CombatEvent::ElementalReactionTriggered { actor, reaction } => {
            info!("{} reaction: {}", actor, reaction.name);
        }
        CombatEvent::ChainCompleted { actor, chain } => {
            info!("{} chain: {}", actor, chain.name);
        }
    }
}

fn print_summary(arena: &Arena, enemies: &[EntityId], elapsed: f64) {
    let mut by_kind: BTreeMap<&'static str, f32> = BTreeMap::new();
    for record in arena.damage_log() {
        let key = match record.kind {
            DamageKind::Physical => "physical",
            DamageKind::Magical => "magical",
            DamageKind::True => "true",
        };
        *by_kind.entry(key).or_default() += record.amount;
    }

    info!("Fight over after {:.1}s", elapsed);
    for (kind, total) in &by_kind {
        info!("  {:>8} damage: {:.1}", kind, total);
    }
    for id in enemies {
        match arena.health(*id) {
            Some(hp) => info!("  {} at {:.1} hp", id, hp),
            None => info!("  {} defeated", id),
        }
    }
    info!("  {} notifications shown", arena.notifications().len());
}
