//! Domain models for the Zyra loop reconciler.

pub mod config;
pub mod detection;
pub mod execution;
pub mod lifecycle;
pub mod phase;
pub mod stats;
pub mod stream;

pub use config::{
    BackendConfig, CompletePolicy, Config, LifecycleConfig, LoggingConfig, NarratorConfig,
    PollingConfig, WatchdogConfig,
};
pub use detection::{
    DetectionPhase, DetectionSnapshot, DetectionStatus, ExecutionPhase, ExecutionStatus,
    StoreReadiness,
};
pub use execution::{ExecutionResult, FieldChange, ProductOptimization};
pub use lifecycle::LifecycleStage;
pub use phase::{Phase, ResolvedPhase};
pub use stats::{FoundationalAction, LiveStatsSnapshot};
pub use stream::{ActivityItem, EventMetric, StreamEvent, StreamEventStatus};
