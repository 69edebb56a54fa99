//! Status effects and status manager
//!
//! The combat engine never stores statuses itself; it reaches them through
//! [`StatusEffectSink`](crate::sink::StatusEffectSink). [`StatusManager`] is the
//! per-entity store used by the in-memory [`Arena`](crate::arena::Arena).

use serde::{Deserialize, Serialize};

use crate::element::DamageType;

/// Types of status effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffectType {
    // Elemental (imply an element on the carrier)
    Burn,   // Fire
    Freeze, // Ice
    Poison, // Poison

    // Debuffs
    Slow,
    Stun,
    Weaken,
    Blind,

    // Buffs
    Regen,
    Shield,
    Haste,
}

/// Statuses stripped by a cleansing (defensive) reaction
pub const NEGATIVE_STATUSES: [StatusEffectType; 7] = [
    StatusEffectType::Burn,
    StatusEffectType::Freeze,
    StatusEffectType::Poison,
    StatusEffectType::Slow,
    StatusEffectType::Stun,
    StatusEffectType::Weaken,
    StatusEffectType::Blind,
];

/// Statuses that imply an element, in lookup order
pub const ELEMENTAL_STATUSES: [StatusEffectType; 3] = [
    StatusEffectType::Burn,
    StatusEffectType::Freeze,
    StatusEffectType::Poison,
];

impl StatusEffectType {
    /// Get the element implied by this status (if it's an elemental status)
    pub fn element(self) -> Option<DamageType> {
        match self {
            Self::Burn => Some(DamageType::Fire),
            Self::Freeze => Some(DamageType::Ice),
            Self::Poison => Some(DamageType::Poison),
            _ => None,
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Burn => "Burn",
            Self::Freeze => "Freeze",
            Self::Poison => "Poison",
            Self::Slow => "Slow",
            Self::Stun => "Stun",
            Self::Weaken => "Weaken",
            Self::Blind => "Blind",
            Self::Regen => "Regen",
            Self::Shield => "Shield",
            Self::Haste => "Haste",
        }
    }
}

/// An active status effect instance
#[derive(Debug, Clone)]
pub struct StatusEffect {
    pub effect_type: StatusEffectType,
    /// Remaining duration in seconds
    pub duration: f32,
    /// Strength of the effect (damage per tick for DOTs, heal per tick for Regen)
    pub magnitude: f32,
    /// Time between ticks
    pub tick_interval: f32,
    /// Timer tracking next tick
    pub tick_timer: f32,
}

impl StatusEffect {
    pub fn new(effect_type: StatusEffectType, magnitude: f32, duration: f32) -> Self {
        let tick_interval = match effect_type {
            StatusEffectType::Burn => 1.0,
            StatusEffectType::Poison => 1.5,
            StatusEffectType::Regen => 1.0,
            _ => 0.0,
        };

        Self {
            effect_type,
            duration,
            magnitude,
            tick_interval,
            tick_timer: tick_interval,
        }
    }

    /// Whether this effect deals damage over time
    pub fn is_damage_over_time(&self) -> bool {
        matches!(
            self.effect_type,
            StatusEffectType::Burn | StatusEffectType::Poison
        ) && self.tick_interval > 0.0
    }

    /// Whether this effect has expired
    pub fn is_expired(&self) -> bool {
        self.duration <= 0.0
    }
}

/// Health change produced by one [`StatusManager::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusTick {
    pub damage: f32,
    pub healing: f32,
}

/// Manages all active status effects on an entity
#[derive(Debug, Clone, Default)]
pub struct StatusManager {
    pub effects: Vec<StatusEffect>,
}

impl StatusManager {
    /// Create a new empty status manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a status effect. If the same type already exists, refresh duration
    /// (take longer) and keep the stronger magnitude.
    pub fn apply(&mut self, effect: StatusEffect) {
        if let Some(existing) = self
            .effects
            .iter_mut()
            .find(|e| e.effect_type == effect.effect_type)
        {
            if effect.duration > existing.duration {
                existing.duration = effect.duration;
            }
            existing.magnitude = existing.magnitude.max(effect.magnitude);
        } else {
            self.effects.push(effect);
        }
    }

    /// Advance every effect by `delta` seconds and drop the expired ones
    pub fn update(&mut self, delta: f32) -> StatusTick {
        let mut tick = StatusTick::default();

        for effect in &mut self.effects {
            effect.duration -= delta;
            if effect.tick_interval <= 0.0 {
                continue;
            }

            effect.tick_timer -= delta;
            if effect.tick_timer <= 0.0 {
                effect.tick_timer += effect.tick_interval;
                if effect.is_damage_over_time() {
                    tick.damage += effect.magnitude;
                } else if effect.effect_type == StatusEffectType::Regen {
                    tick.healing += effect.magnitude;
                }
            }
        }

        self.effects.retain(|e| !e.is_expired());
        tick
    }

    /// Remove a status type. Returns true if it was present.
    pub fn remove(&mut self, effect_type: StatusEffectType) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.effect_type != effect_type);
        self.effects.len() != before
    }

    /// Check if a specific status type is active
    pub fn has_effect(&self, effect_type: StatusEffectType) -> bool {
        self.effects.iter().any(|e| e.effect_type == effect_type)
    }

    /// Get an active effect by type
    pub fn get(&self, effect_type: StatusEffectType) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.effect_type == effect_type)
    }

    /// Number of active effects
    pub fn count(&self) -> usize {
        self.effects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burn_dot() {
        let mut mgr = StatusManager::new();
        mgr.apply(StatusEffect::new(StatusEffectType::Burn, 5.0, 5.0));

        let tick = mgr.update(1.0);
        assert_eq!(tick.damage, 5.0);
        assert_eq!(tick.healing, 0.0);
    }

    #[test]
    fn test_slow_deals_no_damage() {
        let mut mgr = StatusManager::new();
        mgr.apply(StatusEffect::new(StatusEffectType::Slow, 3.0, 5.0));
        assert_eq!(mgr.update(2.0), StatusTick::default());
    }

    #[test]
    fn test_regen_heals_on_its_interval() {
        let mut mgr = StatusManager::new();
        mgr.apply(StatusEffect::new(StatusEffectType::Regen, 2.0, 5.0));
        assert_eq!(mgr.update(0.5).healing, 0.0);
        assert_eq!(mgr.update(0.5).healing, 2.0);
    }

    #[test]
    fn test_effect_expires() {
        let mut mgr = StatusManager::new();
        mgr.apply(StatusEffect::new(StatusEffectType::Burn, 1.0, 2.0));
        assert_eq!(mgr.count(), 1);

        mgr.update(3.0);
        assert_eq!(mgr.count(), 0);
    }

    #[test]
    fn test_refresh_duration() {
        let mut mgr = StatusManager::new();
        mgr.apply(StatusEffect::new(StatusEffectType::Burn, 1.0, 3.0));
        mgr.update(1.0);

        mgr.apply(StatusEffect::new(StatusEffectType::Burn, 2.0, 5.0));
        assert_eq!(mgr.count(), 1);
        assert_eq!(mgr.effects[0].duration, 5.0);
        assert_eq!(mgr.effects[0].magnitude, 2.0);
    }

    #[test]
    fn test_remove() {
        let mut mgr = StatusManager::new();
        mgr.apply(StatusEffect::new(StatusEffectType::Stun, 0.0, 1.0));
        assert!(mgr.remove(StatusEffectType::Stun));
        assert!(!mgr.remove(StatusEffectType::Stun));
        assert!(!mgr.has_effect(StatusEffectType::Stun));
    }

    #[test]
    fn test_elemental_statuses_map_to_elements() {
        for status in ELEMENTAL_STATUSES {
            assert!(status.element().is_some());
            assert!(NEGATIVE_STATUSES.contains(&status));
        }
        assert_eq!(StatusEffectType::Regen.element(), None);
        assert!(!NEGATIVE_STATUSES.contains(&StatusEffectType::Shield));
    }
}
