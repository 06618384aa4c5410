//! Application configuration, stored as TOML.
//!
//! Holds the engine tick interval and the weekly budget defaults, at
//! `~/.config/daybeat/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::budget::BudgetAllocation;
use crate::error::ConfigError;

/// Returns `~/.config/daybeat[-dev]/` based on DAYBEAT_ENV.
///
/// DAYBEAT_HOME overrides the directory outright (used by tests);
/// DAYBEAT_ENV=dev switches to the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = if let Ok(home) = std::env::var("DAYBEAT_HOME") {
        PathBuf::from(home)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("DAYBEAT_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("daybeat-dev")
        } else {
            base_dir.join("daybeat")
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Trigger-engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Clock resolution in seconds. Also the freshness window: a boundary
    /// crossed within one tick of now prompts; older crossings auto-resolve.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

/// Weekly budget defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_work_hours")]
    pub work_hours: f64,
    #[serde(default = "default_sleep_hours")]
    pub sleep_hours: f64,
    #[serde(default = "default_relax_hours")]
    pub relax_hours: f64,
}

/// Top-level configuration, one section per concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
}

// Per-field serde defaults
fn default_tick_secs() -> u64 {
    1
}
fn default_work_hours() -> f64 {
    20.0
}
fn default_sleep_hours() -> f64 {
    60.0
}
fn default_relax_hours() -> f64 {
    20.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            work_hours: default_work_hours(),
            sleep_hours: default_sleep_hours(),
            relax_hours: default_relax_hours(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Tick interval for the runtime clock.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }

    /// Freshness window for the trigger scan, equal to one tick.
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.tick_secs.max(1) as i64)
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but does not parse, and when the
    /// first-run defaults cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, falling back to the defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Write back to disk.
    ///
    /// # Errors
    ///
    /// Fails when the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// The budget allocation configured for this week.
    pub fn budget_allocation(&self) -> BudgetAllocation {
        BudgetAllocation {
            work: self.budget.work_hours,
            sleep: self.budget.sleep_hours,
            relax: self.budget.relax_hours,
        }
    }

    /// Store a new allocation in the budget section.
    pub fn set_budget_allocation(&mut self, allocation: BudgetAllocation) {
        self.budget.work_hours = allocation.work;
        self.budget.sleep_hours = allocation.sleep;
        self.budget.relax_hours = allocation.relax;
    }
}
