//! Progress narrator.
//!
//! Maps the resolved phase (and, for detect, the backend's sub-stage) to
//! merchant-facing copy, rotating between a few pre-authored variants for
//! perceived liveliness. Strictly one-way: this module consumes resolver
//! output and feeds nothing back; the rotation counter carries no semantic
//! weight.

use crate::domain::models::{DetectionPhase, Phase};

/// Copy variants for the detect phase, keyed by backend sub-stage.
const DETECT_IDLE: &[&str] = &[
    "Watching your storefront for friction",
    "Standing by for the next scan",
];
const DETECT_STARTED: &[&str] = &[
    "Scanning your store for revenue friction",
    "Reading storefront signals",
    "Starting a fresh detection pass",
];
const DETECT_CACHE_LOADED: &[&str] = &[
    "Store snapshot loaded, digging in",
    "Comparing against your catalog baseline",
];
const DETECT_FRICTION_IDENTIFIED: &[&str] = &[
    "Found something worth a closer look",
    "Scoring friction candidates",
    "Weighing impact against risk",
];
const DETECT_DECISION_READY: &[&str] = &[
    "Decision ready for your review",
    "An action is waiting on you",
];
const DETECT_PREPARING: &[&str] = &[
    "Preparing the content change",
    "Drafting the update",
];

const DECIDE: &[&str] = &[
    "Reviewing the recommended action",
    "An optimization is awaiting approval",
    "Your call: approve or skip",
];
const EXECUTE: &[&str] = &[
    "Applying approved changes to your store",
    "Publishing optimized content",
    "Rolling the change out",
];
const PROVE: &[&str] = &[
    "Verifying changes landed correctly",
    "Checking the storefront took the update",
    "Validating the published content",
];
const LEARN: &[&str] = &[
    "Recording what worked",
    "Feeding results back into detection",
    "Updating the model with this outcome",
];

/// Stateless copy selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Narrator;

impl Narrator {
    /// Pick the copy line for a phase. `rotation` is the caller's tick
    /// counter (incremented every rotate interval); identical inputs always
    /// yield identical copy.
    pub fn describe(
        phase: Phase,
        detection_stage: Option<DetectionPhase>,
        rotation: usize,
    ) -> &'static str {
        let variants = Self::variants(phase, detection_stage);
        variants[rotation % variants.len()]
    }

    fn variants(phase: Phase, detection_stage: Option<DetectionPhase>) -> &'static [&'static str] {
        match phase {
            Phase::Detect => match detection_stage.unwrap_or(DetectionPhase::Idle) {
                DetectionPhase::Idle => DETECT_IDLE,
                DetectionPhase::DetectStarted => DETECT_STARTED,
                DetectionPhase::CacheLoaded => DETECT_CACHE_LOADED,
                DetectionPhase::FrictionIdentified => DETECT_FRICTION_IDENTIFIED,
                DetectionPhase::DecisionReady => DETECT_DECISION_READY,
                DetectionPhase::Preparing => DETECT_PREPARING,
            },
            Phase::Decide => DECIDE,
            Phase::Execute => EXECUTE,
            Phase::Prove => PROVE,
            Phase::Learn => LEARN,
        }
    }
}
