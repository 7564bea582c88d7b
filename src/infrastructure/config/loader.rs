//! Hierarchical configuration loading.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("backend base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid polling interval for {name}: {value}. Must be positive")]
    InvalidPollInterval { name: &'static str, value: u64 },

    #[error("Invalid dwell_ms: {0}. Must be positive")]
    InvalidDwell(u64),

    #[error("Invalid watchdog threshold for {name}: {value}. Must be positive")]
    InvalidWatchdogThreshold { name: &'static str, value: u64 },
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .zyra/config.yaml (project config)
    /// 3. .zyra/local.yaml (project local overrides, optional)
    /// 4. Environment variables (ZYRA_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".zyra/config.yaml"))
            .merge(Yaml::file(".zyra/local.yaml"))
            .merge(Env::prefixed("ZYRA_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.backend.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        for (name, value) in [
            ("detection_active_ms", config.polling.detection_active_ms),
            ("detection_idle_ms", config.polling.detection_idle_ms),
            ("stats_ms", config.polling.stats_ms),
            ("activity_ms", config.polling.activity_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidPollInterval { name, value });
            }
        }

        if config.lifecycle.dwell_ms == 0 {
            return Err(ConfigError::InvalidDwell(config.lifecycle.dwell_ms));
        }

        for (name, value) in [
            ("running_ms", config.watchdog.running_ms),
            ("approval_ms", config.watchdog.approval_ms),
            ("detection_timeout_ms", config.watchdog.detection_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidWatchdogThreshold { name, value });
            }
        }

        Ok(())
    }
}
