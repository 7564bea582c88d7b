//! Logger initialization.
//!
//! Builds a tracing-subscriber registry from [`LoggingConfig`]: an
//! `EnvFilter` honoring `RUST_LOG`, a stderr layer in the configured
//! format, and optionally a daily-rotated JSON file layer when a log
//! directory is set.

use std::io;

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;

/// Initialized logger. Keep this alive for the process lifetime: dropping
/// it flushes and closes the non-blocking file writer.
pub struct Logger {
    _guard: Option<WorkerGuard>,
}

impl Logger {
    /// Initialize the global subscriber from configuration.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let guard = if let Some(ref log_dir) = config.log_dir {
            let file_appender = rolling::daily(log_dir, "zyra.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            // File output is always JSON for structured ingestion.
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter.clone());

            if config.format == "json" {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_filter(env_filter);
                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(stderr_layer)
                    .init();
            } else {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_filter(env_filter);
                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(stderr_layer)
                    .init();
            }

            Some(guard)
        } else {
            if config.format == "json" {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_filter(env_filter);
                tracing_subscriber::registry().with(stderr_layer).init();
            } else {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_filter(env_filter);
                tracing_subscriber::registry().with(stderr_layer).init();
            }
            None
        };

        Ok(Self { _guard: guard })
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("invalid log level: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }
}
