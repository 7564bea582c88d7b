//! Detection cycle snapshot model.
//!
//! Primary signal source: the backend's own report of detection progress
//! and the execution state of any committed action.

use serde::{Deserialize, Serialize};

/// Backend-reported sub-stage of a detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionPhase {
    /// No cycle running.
    Idle,
    /// Cycle kicked off, nothing scanned yet.
    DetectStarted,
    /// Store snapshot loaded from cache.
    CacheLoaded,
    /// At least one friction factor scored.
    FrictionIdentified,
    /// An action has been selected and is awaiting approval.
    DecisionReady,
    /// Content change being prepared for publication.
    Preparing,
}

impl Default for DetectionPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Outcome classification of a detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    /// Cycle still running.
    Detecting,
    /// Friction found, an action is on offer.
    FrictionFound,
    /// Scan finished clean.
    NoFriction,
    /// Store lacks the data needed for full detection.
    InsufficientData,
    /// A pre-set foundational action is offered instead.
    FoundationalAction,
}

impl Default for DetectionStatus {
    fn default() -> Self {
        Self::Detecting
    }
}

/// Coarse execution state of the committed action, as the backend sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Idle,
    Pending,
    Running,
    AwaitingApproval,
    Completed,
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained execution sub-phase reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    Idle,
    Executing,
    Proving,
    Learning,
    Completed,
}

impl Default for ExecutionPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl ExecutionPhase {
    /// Active means mid-execution: neither idle nor completed.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Completed)
    }
}

/// Server-reported detection progress.
///
/// Invariant: `complete` is monotonic within one detection cycle. The
/// reconciler latches it and only an explicit new-cycle trigger clears it;
/// a later snapshot flipping back to `false` must not un-complete the cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    /// Sub-stage of the running cycle.
    #[serde(default)]
    pub phase: DetectionPhase,
    /// Outcome classification.
    #[serde(default)]
    pub status: DetectionStatus,
    /// Whether the cycle has finished.
    #[serde(default)]
    pub complete: bool,
    /// Opaque id of the action awaiting approval, when one exists.
    #[serde(default)]
    pub committed_action_id: Option<String>,
    /// Coarse execution state of the committed action.
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    /// Fine-grained execution sub-phase.
    #[serde(default)]
    pub execution_phase: ExecutionPhase,
}

/// Store readiness gate for detection polling.
///
/// Detection polling is only enabled once the store's data sync has
/// finished; stats polling serves as the sole source until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreReadiness {
    /// Sync state unknown (startup).
    Pending,
    /// Store data is ready; full detection polling allowed.
    Ready,
    /// Store is connected but not yet synced.
    NotReady,
}

impl Default for StoreReadiness {
    fn default() -> Self {
        Self::Pending
    }
}

impl StoreReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}
