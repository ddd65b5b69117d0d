//! # Configuration
//!
//! Tick lengths, the post-load delay and host settings. Loaded from the
//! environment (optionally via `.env`) or from a YAML file.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: YAML file support via REMINDERS_CONFIG_PATH
//! - 1.0.0: Initial release with environment variables

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;

use super::ticks::Tick;

/// Scheduler and host configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Length of one in-game hour in ticks
    #[serde(default = "default_ticks_per_hour")]
    pub ticks_per_hour: Tick,

    /// Hours in one in-game day
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: Tick,

    /// Ticks to wait after a world load before next-load reminders fire
    #[serde(default = "default_delay_after_load")]
    pub delay_after_load: Tick,

    /// Default log filter for env_logger
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where the simulation host keeps its save file
    #[serde(default = "default_save_path")]
    pub save_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ticks_per_hour: default_ticks_per_hour(),
            hours_per_day: default_hours_per_day(),
            delay_after_load: default_delay_after_load(),
            log_level: default_log_level(),
            save_path: default_save_path(),
        }
    }
}

impl Config {
    /// Build configuration from environment variables.
    ///
    /// If `REMINDERS_CONFIG_PATH` is set, the YAML file is loaded first and
    /// individual variables override its values.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("REMINDERS_CONFIG_PATH") {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };

        if let Some(value) = env_tick("REMINDERS_TICKS_PER_HOUR")? {
            config.ticks_per_hour = value;
        }
        if let Some(value) = env_tick("REMINDERS_HOURS_PER_DAY")? {
            config.hours_per_day = value;
        }
        if let Some(value) = env_tick("REMINDERS_DELAY_AFTER_LOAD")? {
            config.delay_after_load = value;
        }
        if let Ok(level) = env::var("REMINDERS_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(path) = env::var("REMINDERS_SAVE_PATH") {
            config.save_path = path;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {path}"))?;
        config.validate()?;
        debug!("Loaded config from {path}");
        Ok(config)
    }

    /// Validate tick lengths and delays
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_hour <= 0 {
            return Err(anyhow::anyhow!(
                "ticks_per_hour must be positive, got {}",
                self.ticks_per_hour
            ));
        }

        if self.hours_per_day <= 0 {
            return Err(anyhow::anyhow!(
                "hours_per_day must be positive, got {}",
                self.hours_per_day
            ));
        }

        if self.delay_after_load < 0 {
            return Err(anyhow::anyhow!(
                "delay_after_load cannot be negative, got {}",
                self.delay_after_load
            ));
        }

        if self.ticks_per_hour.checked_mul(self.hours_per_day).is_none() {
            return Err(anyhow::anyhow!(
                "ticks_per_hour ({}) times hours_per_day ({}) overflows a tick",
                self.ticks_per_hour,
                self.hours_per_day
            ));
        }

        Ok(())
    }

    /// Length of one in-game day in ticks
    pub fn ticks_per_day(&self) -> Tick {
        self.ticks_per_hour * self.hours_per_day
    }
}

fn env_tick(key: &str) -> Result<Option<Tick>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<Tick>()
            .map(Some)
            .with_context(|| format!("{key} must be an integer, got {raw:?}")),
        Err(_) => Ok(None),
    }
}

fn default_ticks_per_hour() -> Tick {
    2500
}

fn default_hours_per_day() -> Tick {
    24
}

fn default_delay_after_load() -> Tick {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_save_path() -> String {
    "reminders.json".to_string()
}
