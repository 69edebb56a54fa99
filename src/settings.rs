//! Sandbox settings with persistence
//!
//! Settings are read from `~/.config/infinite/sandbox.toml`. Combat rules live
//! next to them in `combat.toml` unless `rules_file` points elsewhere.

use std::fs;
use std::path::PathBuf;

use infinite_combat::CombatRules;
use infinite_core::TimeConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All sandbox settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub time: TimeConfig,
    pub scenario: ScenarioSettings,
    /// Combat rules file; defaults to `combat.toml` in the config directory
    pub rules_file: Option<PathBuf>,
}

impl SandboxSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("infinite"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("sandbox.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No sandbox settings found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load combat rules, falling back to the built-in set on any problem
    pub fn load_rules(&self) -> CombatRules {
        let path = self
            .rules_file
            .clone()
            .or_else(|| Self::config_dir().map(|p| p.join("combat.toml")));

        let Some(path) = path.filter(|p| p.exists()) else {
            info!("No combat rules file found, using built-in rules");
            return CombatRules::default();
        };

        match CombatRules::load(&path) {
            Ok(rules) => rules,
            Err(e) => {
                warn!("{}, using built-in rules", e);
                CombatRules::default()
            }
        }
    }
}

/// Scripted fight parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    /// Simulated fight length in seconds
    pub duration: f32,
    /// Seconds between casts
    pub cast_interval: f32,
    pub enemy_count: u32,
    pub enemy_health: f32,
    /// Enemies stand on a ring of this radius around the impact point
    pub ring_radius: f32,
    /// Lifetime of the status a direct hit leaves behind
    pub hit_status_duration: f32,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            duration: 30.0,
            cast_interval: 0.8,
            enemy_count: 6,
            enemy_health: 600.0,
            ring_radius: 2.5,
            hit_status_duration: 4.0,
        }
    }
}
