//! Extended elemental afflictions
//!
//! Elements without a standard status (Lightning, Dark, Holy, Physical) are
//! stored here, one per target. Expiry is checked lazily on lookup.

use std::collections::HashMap;

use infinite_core::EntityId;

use crate::element::DamageType;

/// An element tag on a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementalAffliction {
    pub element: DamageType,
    /// Seconds
    pub applied_at: f64,
    /// Seconds
    pub duration: f32,
}

impl ElementalAffliction {
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.applied_at > self.duration as f64
    }
}

#[derive(Debug, Clone, Default)]
pub struct AfflictionStore {
    afflictions: HashMap<EntityId, ElementalAffliction>,
}

impl AfflictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an affliction, replacing whatever the target had
    pub fn apply(&mut self, target: EntityId, element: DamageType, now: f64, duration: f32) {
        self.afflictions.insert(
            target,
            ElementalAffliction {
                element,
                applied_at: now,
                duration,
            },
        );
    }

    /// Live element on a target; an expired entry is dropped
    pub fn current(&mut self, target: EntityId, now: f64) -> Option<DamageType> {
        let affliction = self.afflictions.get(&target)?;
        if affliction.is_expired(now) {
            self.afflictions.remove(&target);
            return None;
        }
        Some(affliction.element)
    }

    /// Read-only lookup that ignores expired entries without dropping them
    pub fn peek(&self, target: EntityId, now: f64) -> Option<&ElementalAffliction> {
        self.afflictions
            .get(&target)
            .filter(|affliction| !affliction.is_expired(now))
    }

    pub fn clear(&mut self, target: EntityId) -> bool {
        self.afflictions.remove(&target).is_some()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn prune(&mut self, now: f64) -> usize {
        let before = self.afflictions.len();
        self.afflictions.retain(|_, affliction| !affliction.is_expired(now));
        before - self.afflictions.len()
    }

    pub fn len(&self) -> usize {
        self.afflictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.afflictions.is_empty()
    }
}
