//! Zyra - Revenue Loop Reconciler
//!
//! Zyra merges the dashboard backend's partially-redundant signal sources
//! (detection polling, live-stats polling, a push activity stream) plus
//! client-local optimistic state into one deterministic, monotonic phase of
//! the revenue optimization cycle: detect -> decide -> execute -> prove ->
//! learn.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, errors, and the backend port
//! - **Service Layer** (`services`): The reconciliation core - resolver,
//!   lifecycle controller, watchdogs, scheduler, narrator, and the
//!   reconciler event loop
//! - **Adapters** (`adapters`): REST and SSE wrappers over the backend
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio::sync::{broadcast, mpsc};
//! use zyra::adapters::{BackendClient, SseStreamAdapter};
//! use zyra::services::{Reconciler, ReconcilerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = zyra::infrastructure::config::ConfigLoader::load()?;
//!     let backend = Arc::new(BackendClient::new(&config.backend)?);
//!     let (shutdown_tx, _) = broadcast::channel(1);
//!     let (stream_tx, stream_rx) = mpsc::channel(256);
//!     SseStreamAdapter::new(&config.backend)?.spawn(stream_tx, shutdown_tx.subscribe());
//!     let handle = Reconciler::new(backend, ReconcilerConfig::from(&config))
//!         .spawn(stream_rx, shutdown_tx.subscribe());
//!     let mut updates = handle.subscribe();
//!     while let Ok(update) = updates.recv().await {
//!         println!("{update:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, DetectionSnapshot, ExecutionResult, LifecycleStage, LiveStatsSnapshot, Phase,
    ResolvedPhase, StreamEvent,
};
pub use domain::ports::BackendApi;
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    resolve, Command, CycleState, LocalState, LoopUpdate, Reconciler, ReconcilerConfig,
    ReconcilerHandle, Resolution, ResolveInputs,
};
