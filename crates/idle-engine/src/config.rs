//! Engine configuration.
//!
//! Provides the scheduler cadence, save location, autosave interval, RNG seed,
//! and combat tuning. Configuration can be loaded from and saved to a file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use idle_common::{Millis, MILLIS_PER_SECOND};
use idle_gameplay::CombatConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "idle.toml";

/// Default save file name.
pub const DEFAULT_SAVE_FILE: &str = "idle_save.json";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the file
    #[error("Config IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to produce TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Scheduling ===
    /// Period of the live tick in milliseconds
    pub tick_interval_ms: Millis,
    /// Stop the headless loop after this many seconds (None = run until killed)
    pub run_for_secs: Option<u64>,

    // === Persistence ===
    /// Roster save file
    pub save_path: PathBuf,
    /// Seconds between saves while an activity is running
    pub autosave_interval_secs: u64,

    // === Content ===
    /// Seed for loot and combat rolls (None = random)
    pub rng_seed: Option<u64>,
    /// TOML catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,

    // === Combat ===
    /// Combat timers and enemy scaling
    pub combat: CombatConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            run_for_secs: None,

            save_path: PathBuf::from(DEFAULT_SAVE_FILE),
            autosave_interval_secs: 10,

            rng_seed: None,
            catalog_path: None,

            combat: CombatConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `idle.toml` in the working directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load config file {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Load configuration from a specific path, surfacing any failure.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_interval_ms = self.tick_interval_ms.clamp(10, 1_000);
        self.autosave_interval_secs = self.autosave_interval_secs.max(1);

        // Zero intervals would make a timer fire every tick
        let combat = &mut self.combat;
        combat.player_attack_interval_ms = combat.player_attack_interval_ms.max(1);
        combat.enemy_attack_interval_ms = combat.enemy_attack_interval_ms.max(1);
        combat.archetype_step = combat.archetype_step.max(1);
        combat.level_step = combat.level_step.max(1);
        combat.hp_scaling = combat.hp_scaling.max(0.0);
        combat.damage_scaling = combat.damage_scaling.max(0.0);
        combat.defense_scaling = combat.defense_scaling.max(0.0);
    }

    /// Autosave interval in milliseconds.
    #[must_use]
    pub fn autosave_interval_ms(&self) -> Millis {
        self.autosave_interval_secs.saturating_mul(MILLIS_PER_SECOND)
    }
}
