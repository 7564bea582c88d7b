//! Configuration model.
//!
//! All timing knobs of the reconciler live here: polling cadences, dwell
//! timers, watchdog thresholds, narration rotation. Loaded hierarchically
//! by the config loader (defaults, project yaml, local yaml, environment).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Zyra.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Backend endpoint configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Polling cadences for the REST signal sources.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Local optimistic lifecycle configuration.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Watchdog thresholds.
    #[serde(default)]
    pub watchdog: WatchdogConfig,

    /// Progress narration configuration.
    #[serde(default)]
    pub narrator: NarratorConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendConfig {
    /// Base URL of the dashboard backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for authenticated endpoints, if required.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl BackendConfig {
    /// Per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Polling cadences for the REST signal sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollingConfig {
    /// Detection poll interval while a cycle is actively running.
    #[serde(default = "default_detection_active_ms")]
    pub detection_active_ms: u64,

    /// Detection poll interval while no cycle is running.
    #[serde(default = "default_detection_idle_ms")]
    pub detection_idle_ms: u64,

    /// Live-stats poll interval. Always on once the store is ready.
    #[serde(default = "default_stats_ms")]
    pub stats_ms: u64,

    /// Execution-activity poll interval while an execution is active.
    #[serde(default = "default_activity_ms")]
    pub activity_ms: u64,
}

const fn default_detection_active_ms() -> u64 {
    1_000
}

const fn default_detection_idle_ms() -> u64 {
    5_000
}

const fn default_stats_ms() -> u64 {
    5_000
}

const fn default_activity_ms() -> u64 {
    800
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            detection_active_ms: default_detection_active_ms(),
            detection_idle_ms: default_detection_idle_ms(),
            stats_ms: default_stats_ms(),
            activity_ms: default_activity_ms(),
        }
    }
}

/// What the local lifecycle does after reaching `complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletePolicy {
    /// Stay in `complete` until an external reset.
    Hold,
    /// After a short delay, reset to idle and refetch authoritative state.
    AutoReset,
}

impl Default for CompletePolicy {
    fn default() -> Self {
        Self::AutoReset
    }
}

/// Local optimistic lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LifecycleConfig {
    /// Dwell time per stage (execute, prove, learn) before auto-advancing.
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,

    /// Behavior once `complete` is reached.
    #[serde(default)]
    pub complete_policy: CompletePolicy,

    /// Delay before an `AutoReset` fires.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
}

const fn default_dwell_ms() -> u64 {
    3_000
}

const fn default_reset_delay_ms() -> u64 {
    2_000
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            dwell_ms: default_dwell_ms(),
            complete_policy: CompletePolicy::default(),
            reset_delay_ms: default_reset_delay_ms(),
        }
    }
}

impl LifecycleConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

/// Watchdog thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WatchdogConfig {
    /// Max time `running` may persist unchanged before a forced refresh.
    #[serde(default = "default_running_ms")]
    pub running_ms: u64,

    /// Max time `awaiting_approval` may persist unchanged before a forced refresh.
    #[serde(default = "default_approval_ms")]
    pub approval_ms: u64,

    /// Max time a detection cycle may run without reporting completion.
    #[serde(default = "default_detection_timeout_ms")]
    pub detection_timeout_ms: u64,
}

const fn default_running_ms() -> u64 {
    30_000
}

const fn default_approval_ms() -> u64 {
    120_000
}

const fn default_detection_timeout_ms() -> u64 {
    10_000
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            running_ms: default_running_ms(),
            approval_ms: default_approval_ms(),
            detection_timeout_ms: default_detection_timeout_ms(),
        }
    }
}

/// Progress narration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NarratorConfig {
    /// How often the copy variant rotates. Presentation only.
    #[serde(default = "default_rotate_ms")]
    pub rotate_ms: u64,
}

const fn default_rotate_ms() -> u64 {
    3_000
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            rotate_ms: default_rotate_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files. Stdout-only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
