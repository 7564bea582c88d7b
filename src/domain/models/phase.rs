//! Loop phase model.
//!
//! The optimization cycle moves through five ordered phases:
//! detect -> decide -> execute -> prove -> learn. The resolver reports
//! exactly one of these per evaluation, never an in-between state.

use serde::{Deserialize, Serialize};

/// One phase of the optimization cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Scanning the store for friction.
    Detect,
    /// A friction finding is waiting on an approval decision.
    Decide,
    /// An approved action is being applied.
    Execute,
    /// Applied changes are being validated against the live store.
    Prove,
    /// Validated outcomes are folded back into the model.
    Learn,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Detect
    }
}

impl Phase {
    /// Stable ordinal used for monotonicity comparisons.
    pub fn index(&self) -> u8 {
        match self {
            Self::Detect => 0,
            Self::Decide => 1,
            Self::Execute => 2,
            Self::Prove => 3,
            Self::Learn => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Decide => "decide",
            Self::Execute => "execute",
            Self::Prove => "prove",
            Self::Learn => "learn",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "detect" => Some(Self::Detect),
            "decide" => Some(Self::Decide),
            "execute" => Some(Self::Execute),
            "prove" => Some(Self::Prove),
            "learn" => Some(Self::Learn),
            _ => None,
        }
    }

    /// Map a stream event type prefix (`DETECT_SCAN`, `EXECUTE_APPLY`, ...)
    /// to its phase. Returns `None` when no known prefix matches.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        let upper = event_type.to_uppercase();
        if upper.starts_with("DETECT_") {
            Some(Self::Detect)
        } else if upper.starts_with("DECIDE_") {
            Some(Self::Decide)
        } else if upper.starts_with("EXECUTE_") {
            Some(Self::Execute)
        } else if upper.starts_with("PROVE_") {
            Some(Self::Prove)
        } else if upper.starts_with("LEARN_") {
            Some(Self::Learn)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolver's output for one evaluation cycle.
///
/// Derived, never persisted: recomputed on every tick and valid only for
/// the evaluation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPhase {
    /// The phase the loop is currently in.
    pub phase: Phase,
    /// Whether the current detection cycle has completed.
    pub is_complete: bool,
}
