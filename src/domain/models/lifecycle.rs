//! Client-local action lifecycle.
//!
//! When the merchant approves an action the client runs an optimistic
//! sub-lifecycle `idle -> execute -> prove -> learn -> complete` on fixed
//! dwell timers, used only while the backend reports no authoritative
//! execution phase. It resets to idle when a new detection cycle begins or
//! the approved action fully completes.

use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Stage of the local optimistic lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    /// No approved action in flight.
    Idle,
    /// Action approved; changes being applied.
    Execute,
    /// Changes applied; validation in progress.
    Prove,
    /// Validation done; recording the outcome.
    Learn,
    /// Lifecycle ran to the end.
    Complete,
}

impl Default for LifecycleStage {
    fn default() -> Self {
        Self::Idle
    }
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Execute => "execute",
            Self::Prove => "prove",
            Self::Learn => "learn",
            Self::Complete => "complete",
        }
    }

    /// In-flight means between approval and completion.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Complete)
    }

    /// The loop phase this stage presents as. Idle has no phase of its own;
    /// Complete presents as learn (the resolver decides whether the result
    /// actually validated).
    pub fn as_phase(&self) -> Option<Phase> {
        match self {
            Self::Idle => None,
            Self::Execute => Some(Phase::Execute),
            Self::Prove => Some(Phase::Prove),
            Self::Learn => Some(Phase::Learn),
            Self::Complete => Some(Phase::Learn),
        }
    }

    /// The stage entered when the current dwell timer fires.
    pub fn advanced(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Execute => Self::Prove,
            Self::Prove => Self::Learn,
            Self::Learn => Self::Complete,
            Self::Complete => Self::Complete,
        }
    }

    /// Valid transitions from this stage.
    pub fn valid_transitions(&self) -> Vec<LifecycleStage> {
        match self {
            Self::Idle => vec![Self::Execute],
            Self::Execute => vec![Self::Prove, Self::Idle],
            Self::Prove => vec![Self::Learn, Self::Idle],
            Self::Learn => vec![Self::Complete, Self::Idle],
            Self::Complete => vec![Self::Idle],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
