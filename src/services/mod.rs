//! Service layer: the reconciliation core.
//!
//! Everything here is framework-free. The resolver is a pure function; the
//! lifecycle controller, watchdogs, and scheduler are deadline-based state
//! machines; the reconciler is the single event loop that drives them.

pub mod lifecycle;
pub mod narrator;
pub mod reconciler;
pub mod resolver;
pub mod scheduler;
pub mod watchdog;

pub use lifecycle::{LifecycleController, LifecycleEvent};
pub use narrator::Narrator;
pub use reconciler::{
    Command, LoopUpdate, NoticeKind, Reconciler, ReconcilerConfig, ReconcilerHandle, StreamSignal,
};
pub use resolver::{
    derived_execution_status, detection_complete, detection_running, resolve, CycleState,
    LocalState, Resolution, ResolveInputs, RULES,
};
pub use scheduler::{PollKind, PollScheduler, ScheduleView};
pub use watchdog::{WatchdogKind, WatchdogService};
