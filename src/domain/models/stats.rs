//! Live-stats snapshot model.
//!
//! Secondary signal source with fields overlapping the detection snapshot.
//! Lower priority than detection when both are fresh; the sole source while
//! detection polling is gated off by store readiness.

use serde::{Deserialize, Serialize};

use super::detection::{DetectionPhase, ExecutionPhase, ExecutionStatus};

/// A pre-set, low-risk action offered to stores without enough data
/// for full detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundationalAction {
    /// Action id, prefixed `foundational_` on the wire.
    pub id: String,
    /// Merchant-facing label.
    pub title: String,
    /// Short pitch for why this action is worth taking.
    #[serde(default)]
    pub description: Option<String>,
}

/// Server-reported live stats, carrying a lower-fidelity copy of the
/// detection and execution state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatsSnapshot {
    /// Mirror of the detection sub-stage.
    #[serde(default)]
    pub detection_phase: DetectionPhase,
    /// Mirror of the detection completion flag.
    #[serde(default)]
    pub detection_complete: bool,
    /// Mirror of the coarse execution state.
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    /// Mirror of the execution sub-phase.
    #[serde(default)]
    pub execution_phase: ExecutionPhase,
    /// Mirror of the committed action id.
    #[serde(default)]
    pub committed_action_id: Option<String>,
    /// Foundational action on offer, if any.
    #[serde(default)]
    pub foundational_action: Option<FoundationalAction>,
}
