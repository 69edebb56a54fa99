//! Damage types and elemental pairing
//!
//! 7 damage types: Physical, Fire, Ice, Lightning, Poison, Dark, Holy.
//! Fire, Ice and Poison are "standard" elements: a target carries them through
//! a status effect (Burn, Freeze, Poison). The rest are "extended" elements and
//! are tracked as explicit afflictions.

use serde::{Deserialize, Serialize};

use crate::status::StatusEffectType;

/// Element carried by a skill use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
    Dark,
    Holy,
}

/// Total number of damage types
pub const DAMAGE_TYPE_COUNT: usize = 7;

impl DamageType {
    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Fire => "Fire",
            Self::Ice => "Ice",
            Self::Lightning => "Lightning",
            Self::Poison => "Poison",
            Self::Dark => "Dark",
            Self::Holy => "Holy",
        }
    }

    /// Status effect that implies this element on a target, if any
    pub fn standard_status(self) -> Option<StatusEffectType> {
        match self {
            Self::Fire => Some(StatusEffectType::Burn),
            Self::Ice => Some(StatusEffectType::Freeze),
            Self::Poison => Some(StatusEffectType::Poison),
            _ => None,
        }
    }

    /// Whether this element must be tracked as an explicit affliction
    pub fn is_extended(self) -> bool {
        self.standard_status().is_none()
    }

    /// All damage type variants
    pub fn all() -> &'static [DamageType] {
        &[
            Self::Physical,
            Self::Fire,
            Self::Ice,
            Self::Lightning,
            Self::Poison,
            Self::Dark,
            Self::Holy,
        ]
    }
}

impl std::fmt::Display for DamageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unordered pair of damage types, normalised so `(a, b)` and `(b, a)` are equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementPair(DamageType, DamageType);

impl ElementPair {
    pub fn new(a: DamageType, b: DamageType) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn first(self) -> DamageType {
        self.0
    }

    pub fn second(self) -> DamageType {
        self.1
    }

    /// Whether both sides are the same element
    pub fn is_self_pair(self) -> bool {
        self.0 == self.1
    }
}
