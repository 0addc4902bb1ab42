//! Configuration file support for Repset.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/repset/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub plans: PlansConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Where plan files are looked up
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlansConfig {
    #[serde(default = "default_plans_dir")]
    pub plans_dir: PathBuf,
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            plans_dir: default_plans_dir(),
        }
    }
}

/// Session engine tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Completable units assumed for a duration-based exercise
    #[serde(default = "default_duration_total_sets")]
    pub duration_total_sets: u32,

    #[serde(default = "default_extend_seconds")]
    pub extend_seconds: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_total_sets: default_duration_total_sets(),
            extend_seconds: default_extend_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// The subset of configuration the session controller consumes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    pub duration_total_sets: u32,
    pub extend_seconds: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_total_sets: default_duration_total_sets(),
            extend_seconds: default_extend_seconds(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("repset")
}

fn default_plans_dir() -> PathBuf {
    default_data_dir().join("plans")
}

fn default_duration_total_sets() -> u32 {
    3
}

fn default_extend_seconds() -> u32 {
    30
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.check()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("repset").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            duration_total_sets: self.session.duration_total_sets,
            extend_seconds: self.session.extend_seconds,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.session.poll_interval_ms)
    }

    /// Path of the JSONL log completed sessions are appended to
    pub fn completion_log_path(&self) -> PathBuf {
        self.data.data_dir.join("completions.jsonl")
    }

    fn check(&self) -> Result<()> {
        if self.session.duration_total_sets == 0 {
            return Err(Error::Config(
                "session.duration_total_sets must be at least 1".into(),
            ));
        }
        if self.session.poll_interval_ms == 0 {
            return Err(Error::Config(
                "session.poll_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
