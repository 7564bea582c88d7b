//! Phase resolver.
//!
//! A deterministic, pure reduction of every signal source into one loop
//! phase. The precedence between sources is the single biggest source of
//! subtle bugs in this kind of reconciliation, so it is expressed as a
//! first-class ordered rule table ([`RULES`]): first matching rule wins,
//! and each rule is individually addressable by name in tests and traces.
//!
//! Monotonicity: within one detection-to-learn cycle the resolver never
//! reports a phase below the cycle's high-water mark, with two deliberate
//! exceptions. A connected live stream (rule `stream-tail`) always wins,
//! because push events are authoritative over any derived or polled state.
//! And the completion rules hold an unvalidated result at `prove` even when
//! the floor sits at `learn`: an execution that reports success without
//! validated content must never be promoted into a success narrative.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::{
    ActivityItem, DetectionPhase, DetectionSnapshot, DetectionStatus, ExecutionPhase,
    ExecutionResult, ExecutionStatus, LifecycleStage, LiveStatsSnapshot, Phase, ResolvedPhase,
    StreamEvent,
};

/// Client-local state feeding the resolver.
///
/// Owned by the reconciler; the resolver only ever borrows it.
#[derive(Debug, Clone, Default)]
pub struct LocalState {
    /// Stage of the optimistic post-approval lifecycle.
    pub lifecycle: LifecycleStage,
    /// Result of the last approved execution, if any.
    pub execution_result: Option<ExecutionResult>,
    /// Action ids the client has already seen through to completion.
    pub completed_action_ids: HashSet<String>,
    /// A detect trigger is in flight and the backend has not yet reported.
    pub detecting: bool,
    /// Historical activity feed, newest last.
    pub activity: Vec<ActivityItem>,
}

/// Per-cycle bookkeeping: the monotonicity floor and the completion latch.
///
/// `complete` is latched the first time a cycle resolves complete and only
/// an explicit new-cycle trigger clears it, so disagreeing sources cannot
/// flip-flop the flag. `cycle_id` is a client-generated correlation id for
/// log lines; it never influences resolution.
#[derive(Debug, Clone)]
pub struct CycleState {
    cycle_id: Uuid,
    high_water: Option<Phase>,
    complete_latched: bool,
}

impl Default for CycleState {
    fn default() -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            high_water: None,
            complete_latched: false,
        }
    }
}

impl CycleState {
    /// Reset for a new detection cycle. The only way the completion latch
    /// and the floor are ever cleared.
    pub fn begin_cycle(&mut self) {
        self.cycle_id = Uuid::new_v4();
        self.high_water = None;
        self.complete_latched = false;
    }

    /// Correlation id of the current cycle.
    pub fn cycle_id(&self) -> Uuid {
        self.cycle_id
    }

    /// Record a resolution: raise the floor (or re-anchor it after an
    /// authoritative override), latch completion.
    pub fn observe(&mut self, resolution: &Resolution) {
        if resolution.overrode_floor {
            self.high_water = Some(resolution.phase);
        } else {
            match self.high_water {
                Some(hw) if hw >= resolution.phase => {}
                _ => self.high_water = Some(resolution.phase),
            }
        }
        if resolution.is_complete {
            self.complete_latched = true;
        }
    }

    /// Latch completion directly (used when a snapshot reports `complete`).
    pub fn latch_complete(&mut self) {
        self.complete_latched = true;
    }

    pub fn complete_latched(&self) -> bool {
        self.complete_latched
    }

    pub fn high_water(&self) -> Option<Phase> {
        self.high_water
    }

    /// Clamp a candidate phase to the cycle's floor.
    fn floor(&self, phase: Phase) -> Phase {
        match self.high_water {
            Some(hw) if hw > phase => hw,
            _ => phase,
        }
    }
}

/// Everything the resolver looks at for one evaluation.
///
/// Borrowed views only; resolving twice with identical inputs yields an
/// identical resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInputs<'a> {
    /// Latest detection snapshot, if one has been fetched this session.
    pub detection: Option<&'a DetectionSnapshot>,
    /// Latest live-stats snapshot, if one has been fetched this session.
    pub stats: Option<&'a LiveStatsSnapshot>,
    /// Append-only stream event log, oldest first.
    pub stream_events: &'a [StreamEvent],
    /// Whether the stream adapter currently holds a live connection.
    pub stream_connected: bool,
    /// Client-local optimistic state.
    pub local: &'a LocalState,
    /// Per-cycle floor and completion latch.
    pub cycle: &'a CycleState,
}

/// The resolver's verdict for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The phase to present.
    pub phase: Phase,
    /// Whether the current detection cycle has completed.
    pub is_complete: bool,
    /// Name of the rule that produced `phase` (for tracing and tests).
    pub rule: &'static str,
    /// Whether an authoritative rule bypassed the monotonicity floor.
    /// [`CycleState::observe`] re-anchors the floor at such a phase instead
    /// of taking the max, so an obsolete high-water mark cannot resurface.
    pub overrode_floor: bool,
}

impl Resolution {
    /// Collapse into the public [`ResolvedPhase`] shape.
    pub fn resolved(&self) -> ResolvedPhase {
        ResolvedPhase {
            phase: self.phase,
            is_complete: self.is_complete,
        }
    }
}

type RuleFn = fn(&ResolveInputs<'_>) -> Option<Phase>;

/// One entry of the precedence table.
pub struct Rule {
    /// Stable rule name, used in traces and tests.
    pub name: &'static str,
    /// Whether this rule may regress below the cycle's high-water mark.
    pub overrides_floor: bool,
    apply: RuleFn,
}

/// The ordered precedence table. First matching rule wins.
pub const RULES: &[Rule] = &[
    Rule {
        name: "stream-tail",
        overrides_floor: true,
        apply: rule_stream_tail,
    },
    Rule {
        name: "validated-result",
        overrides_floor: false,
        apply: rule_validated_result,
    },
    Rule {
        name: "backend-execution-active",
        overrides_floor: false,
        apply: rule_backend_execution_active,
    },
    Rule {
        name: "backend-execution-completed",
        // The unvalidated branch deliberately holds at prove even when the
        // cycle's floor sits at learn; promoting it would fake a success.
        overrides_floor: true,
        apply: rule_backend_execution_completed,
    },
    Rule {
        name: "local-lifecycle-active",
        overrides_floor: false,
        apply: rule_local_lifecycle_active,
    },
    Rule {
        name: "local-lifecycle-complete",
        // Same validation gate as backend-execution-completed.
        overrides_floor: true,
        apply: rule_local_lifecycle_complete,
    },
    Rule {
        name: "derived-running",
        overrides_floor: false,
        apply: rule_derived_running,
    },
    Rule {
        name: "derived-awaiting-approval",
        overrides_floor: false,
        apply: rule_derived_awaiting_approval,
    },
    Rule {
        name: "derived-pending-or-detecting",
        overrides_floor: false,
        apply: rule_derived_pending_or_detecting,
    },
    Rule {
        name: "activity-history",
        overrides_floor: false,
        apply: rule_activity_history,
    },
    Rule {
        name: "default",
        overrides_floor: false,
        apply: rule_default,
    },
];

/// Resolve the current loop phase from all signal sources.
pub fn resolve(inputs: &ResolveInputs<'_>) -> Resolution {
    let is_complete = detection_complete(inputs) || inputs.cycle.complete_latched();

    for rule in RULES {
        if let Some(phase) = (rule.apply)(inputs) {
            let phase = if rule.overrides_floor {
                phase
            } else {
                inputs.cycle.floor(phase)
            };
            return Resolution {
                phase,
                is_complete,
                rule: rule.name,
                overrode_floor: rule.overrides_floor,
            };
        }
    }

    // The table ends with an unconditional default; this is unreachable in
    // practice but keeps the function total without panicking.
    Resolution {
        phase: inputs.cycle.floor(Phase::Detect),
        is_complete,
        rule: "default",
        overrode_floor: false,
    }
}

// ============================================================================
// Rules, in precedence order
// ============================================================================

/// Rule 1: a connected stream's last event is authoritative, even when it
/// describes an earlier phase than something already shown.
fn rule_stream_tail(i: &ResolveInputs<'_>) -> Option<Phase> {
    if !i.stream_connected {
        return None;
    }
    i.stream_events.last().map(StreamEvent::resolved_phase)
}

/// Rule 2: a validated execution result pins the loop at learn.
fn rule_validated_result(i: &ResolveInputs<'_>) -> Option<Phase> {
    if has_validated_result(i) {
        Some(Phase::Learn)
    } else {
        None
    }
}

/// Rule 3: the backend's execution sub-phase, while active, maps directly.
fn rule_backend_execution_active(i: &ResolveInputs<'_>) -> Option<Phase> {
    match backend_execution_phase(i) {
        Some(ExecutionPhase::Executing) => Some(Phase::Execute),
        Some(ExecutionPhase::Proving) => Some(Phase::Prove),
        Some(ExecutionPhase::Learning) => Some(Phase::Learn),
        _ => None,
    }
}

/// Rule 4: backend says completed. Learn only with a validated result;
/// otherwise stay in prove rather than claiming an unverified success.
fn rule_backend_execution_completed(i: &ResolveInputs<'_>) -> Option<Phase> {
    if backend_execution_phase(i) == Some(ExecutionPhase::Completed) {
        Some(if has_validated_result(i) {
            Phase::Learn
        } else {
            Phase::Prove
        })
    } else {
        None
    }
}

/// Rule 5: the local optimistic lifecycle, while in flight.
fn rule_local_lifecycle_active(i: &ResolveInputs<'_>) -> Option<Phase> {
    if i.local.lifecycle.is_active() {
        i.local.lifecycle.as_phase()
    } else {
        None
    }
}

/// Rule 6: the local lifecycle finished; same validation gate as rule 4.
fn rule_local_lifecycle_complete(i: &ResolveInputs<'_>) -> Option<Phase> {
    if i.local.lifecycle == LifecycleStage::Complete {
        Some(if has_validated_result(i) {
            Phase::Learn
        } else {
            Phase::Prove
        })
    } else {
        None
    }
}

/// Rule 7: derived status running.
fn rule_derived_running(i: &ResolveInputs<'_>) -> Option<Phase> {
    (derived_execution_status(i) == ExecutionStatus::Running).then_some(Phase::Execute)
}

/// Rule 8: derived status awaiting approval.
fn rule_derived_awaiting_approval(i: &ResolveInputs<'_>) -> Option<Phase> {
    (derived_execution_status(i) == ExecutionStatus::AwaitingApproval).then_some(Phase::Decide)
}

/// Rule 9: derived status pending, or a detection cycle actively running.
fn rule_derived_pending_or_detecting(i: &ResolveInputs<'_>) -> Option<Phase> {
    (derived_execution_status(i) == ExecutionStatus::Pending || detection_running(i))
        .then_some(Phase::Detect)
}

/// Rule 10: fall back to the most recent historical activity item.
fn rule_activity_history(i: &ResolveInputs<'_>) -> Option<Phase> {
    i.local.activity.last().map(|item| item.phase)
}

/// Rule 11: nothing to go on; show detect.
#[allow(clippy::unnecessary_wraps)]
fn rule_default(_: &ResolveInputs<'_>) -> Option<Phase> {
    Some(Phase::Detect)
}

// ============================================================================
// Sub-algorithms
// ============================================================================

/// Derived execution status, consumed by rules 7-9.
///
/// Client knowledge wins over the backend's own field: an action the client
/// already marked completed (or a finished local lifecycle) is `completed`
/// regardless of what a stale poll claims.
pub fn derived_execution_status(i: &ResolveInputs<'_>) -> ExecutionStatus {
    let committed_id = i
        .detection
        .and_then(|d| d.committed_action_id.as_deref())
        .or_else(|| i.stats.and_then(|s| s.committed_action_id.as_deref()));

    let client_completed = committed_id
        .is_some_and(|id| i.local.completed_action_ids.contains(id))
        || i.local.lifecycle == LifecycleStage::Complete;
    if client_completed {
        return ExecutionStatus::Completed;
    }

    if backend_execution_phase(i).is_some_and(|p| p.is_active()) {
        return ExecutionStatus::Running;
    }

    if i.local.lifecycle.is_active() {
        return ExecutionStatus::Running;
    }

    i.detection
        .map(|d| d.execution_status)
        .or_else(|| i.stats.map(|s| s.execution_status))
        .unwrap_or(ExecutionStatus::Idle)
}

/// Whether the current detection cycle is complete.
///
/// A logical OR across independently-updating sources: each disjunct is
/// sufficient on its own.
pub fn detection_complete(i: &ResolveInputs<'_>) -> bool {
    let status_settled = i
        .detection
        .is_some_and(|d| d.status != DetectionStatus::Detecting);
    let stats_complete = i.stats.is_some_and(|s| s.detection_complete);
    let decision_ready = i
        .detection
        .map(|d| d.phase)
        .or_else(|| i.stats.map(|s| s.detection_phase))
        == Some(DetectionPhase::DecisionReady);

    status_settled || stats_complete || decision_ready
}

/// Whether a detection cycle is actively running right now.
pub fn detection_running(i: &ResolveInputs<'_>) -> bool {
    if detection_complete(i) {
        return false;
    }
    if i.local.detecting {
        return true;
    }
    let phase = i
        .detection
        .map(|d| d.phase)
        .or_else(|| i.stats.map(|s| s.detection_phase));
    matches!(
        phase,
        Some(
            DetectionPhase::DetectStarted
                | DetectionPhase::CacheLoaded
                | DetectionPhase::FrictionIdentified
                | DetectionPhase::Preparing
        )
    )
}

/// Detection snapshot wins over stats when both are present; stats is the
/// sole source while detection polling is gated off.
fn backend_execution_phase(i: &ResolveInputs<'_>) -> Option<ExecutionPhase> {
    i.detection
        .map(|d| d.execution_phase)
        .or_else(|| i.stats.map(|s| s.execution_phase))
}

fn has_validated_result(i: &ResolveInputs<'_>) -> bool {
    i.local
        .execution_result
        .as_ref()
        .is_some_and(ExecutionResult::has_validated_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FieldChange, ProductOptimization, StreamEventStatus};
    use chrono::Utc;

    /// Owned fixture so tests can build `ResolveInputs` tersely.
    #[derive(Default)]
    struct Fixture {
        detection: Option<DetectionSnapshot>,
        stats: Option<LiveStatsSnapshot>,
        stream_events: Vec<StreamEvent>,
        stream_connected: bool,
        local: LocalState,
        cycle: CycleState,
    }

    impl Fixture {
        fn inputs(&self) -> ResolveInputs<'_> {
            ResolveInputs {
                detection: self.detection.as_ref(),
                stats: self.stats.as_ref(),
                stream_events: &self.stream_events,
                stream_connected: self.stream_connected,
                local: &self.local,
                cycle: &self.cycle,
            }
        }
    }

    fn stream_event(event_type: &str, phase: Phase) -> StreamEvent {
        StreamEvent {
            id: format!("evt-{event_type}"),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            phase,
            status: StreamEventStatus::InProgress,
            message: String::new(),
            detail: None,
            metrics: Vec::new(),
        }
    }

    fn validated_result() -> ExecutionResult {
        ExecutionResult {
            success: true,
            action_label: "Rewrite titles".to_string(),
            products_optimized: vec![ProductOptimization {
                product_id: "p1".to_string(),
                product_name: "Shirt".to_string(),
                changes: vec![FieldChange {
                    field: "title".to_string(),
                    before: "a".to_string(),
                    after: "b".to_string(),
                    reason: None,
                }],
                impact_explanation: None,
            }],
            total_changes: 1,
            estimated_impact: None,
            execution_time_ms: 10,
        }
    }

    fn unvalidated_result() -> ExecutionResult {
        let mut result = validated_result();
        result.products_optimized[0].changes[0].after = String::new();
        result
    }

    #[test]
    fn test_stream_tail_wins_over_everything() {
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            execution_status: ExecutionStatus::AwaitingApproval,
            ..Default::default()
        });
        fx.stream_connected = true;
        fx.stream_events = vec![
            stream_event("DETECT_SCAN", Phase::Detect),
            stream_event("EXECUTE_APPLY", Phase::Execute),
        ];

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Execute);
        assert_eq!(resolution.rule, "stream-tail");
    }

    #[test]
    fn test_disconnected_stream_is_ignored() {
        let mut fx = Fixture::default();
        fx.stream_connected = false;
        fx.stream_events = vec![stream_event("EXECUTE_APPLY", Phase::Execute)];

        let resolution = resolve(&fx.inputs());
        assert_ne!(resolution.rule, "stream-tail");
    }

    #[test]
    fn test_stream_tail_may_regress_below_floor() {
        let mut fx = Fixture::default();
        fx.cycle.observe(&Resolution {
            phase: Phase::Prove,
            is_complete: false,
            rule: "test",
            overrode_floor: false,
        });
        fx.stream_connected = true;
        fx.stream_events = vec![stream_event("DETECT_SCAN", Phase::Detect)];

        // Authoritative push events are allowed to go backwards.
        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Detect);
    }

    #[test]
    fn test_polled_rules_clamp_to_floor() {
        let mut fx = Fixture::default();
        fx.cycle.observe(&Resolution {
            phase: Phase::Execute,
            is_complete: false,
            rule: "test",
            overrode_floor: false,
        });
        fx.local.detecting = true;

        // Rule 9 would say detect, but the floor holds at execute.
        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Execute);
        assert_eq!(resolution.rule, "derived-pending-or-detecting");
    }

    #[test]
    fn test_validated_result_resolves_learn() {
        let mut fx = Fixture::default();
        fx.local.execution_result = Some(validated_result());

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Learn);
        assert_eq!(resolution.rule, "validated-result");
    }

    #[test]
    fn test_unvalidated_completion_stays_in_prove() {
        let mut fx = Fixture::default();
        fx.local.execution_result = Some(unvalidated_result());
        fx.detection = Some(DetectionSnapshot {
            execution_phase: ExecutionPhase::Completed,
            ..Default::default()
        });

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Prove);
        assert_eq!(resolution.rule, "backend-execution-completed");
    }

    #[test]
    fn test_backend_execution_phases_map_directly() {
        for (exec_phase, expected) in [
            (ExecutionPhase::Executing, Phase::Execute),
            (ExecutionPhase::Proving, Phase::Prove),
            (ExecutionPhase::Learning, Phase::Learn),
        ] {
            let mut fx = Fixture::default();
            fx.detection = Some(DetectionSnapshot {
                execution_phase: exec_phase,
                ..Default::default()
            });
            let resolution = resolve(&fx.inputs());
            assert_eq!(resolution.phase, expected);
            assert_eq!(resolution.rule, "backend-execution-active");
        }
    }

    #[test]
    fn test_stats_execution_phase_is_fallback() {
        let mut fx = Fixture::default();
        fx.stats = Some(LiveStatsSnapshot {
            execution_phase: ExecutionPhase::Proving,
            ..Default::default()
        });

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Prove);
    }

    #[test]
    fn test_detection_beats_stats_when_both_present() {
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            execution_phase: ExecutionPhase::Executing,
            ..Default::default()
        });
        fx.stats = Some(LiveStatsSnapshot {
            execution_phase: ExecutionPhase::Learning,
            ..Default::default()
        });

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Execute);
    }

    #[test]
    fn test_local_lifecycle_drives_when_backend_idle() {
        for (stage, expected) in [
            (LifecycleStage::Execute, Phase::Execute),
            (LifecycleStage::Prove, Phase::Prove),
            (LifecycleStage::Learn, Phase::Learn),
        ] {
            let mut fx = Fixture::default();
            fx.local.lifecycle = stage;
            let resolution = resolve(&fx.inputs());
            assert_eq!(resolution.phase, expected);
            assert_eq!(resolution.rule, "local-lifecycle-active");
        }
    }

    #[test]
    fn test_lifecycle_complete_without_result_is_prove() {
        let mut fx = Fixture::default();
        fx.local.lifecycle = LifecycleStage::Complete;

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Prove);
        assert_eq!(resolution.rule, "local-lifecycle-complete");
    }

    #[test]
    fn test_awaiting_approval_resolves_decide() {
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            status: DetectionStatus::FrictionFound,
            complete: true,
            execution_status: ExecutionStatus::AwaitingApproval,
            committed_action_id: Some("opp-42".to_string()),
            ..Default::default()
        });

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Decide);
        assert_eq!(resolution.rule, "derived-awaiting-approval");
        assert!(resolution.is_complete);
    }

    #[test]
    fn test_client_completed_action_overrides_backend_status() {
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            status: DetectionStatus::FrictionFound,
            execution_status: ExecutionStatus::AwaitingApproval,
            committed_action_id: Some("opp-42".to_string()),
            ..Default::default()
        });
        fx.local.completed_action_ids.insert("opp-42".to_string());

        assert_eq!(
            derived_execution_status(&fx.inputs()),
            ExecutionStatus::Completed
        );
    }

    #[test]
    fn test_detecting_resolves_detect() {
        let mut fx = Fixture::default();
        fx.local.detecting = true;

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Detect);
        assert_eq!(resolution.rule, "derived-pending-or-detecting");
    }

    #[test]
    fn test_activity_history_fallback() {
        let mut fx = Fixture::default();
        fx.local.activity = vec![ActivityItem {
            id: "a1".to_string(),
            timestamp: Utc::now(),
            phase: Phase::Learn,
            message: "Recorded outcome".to_string(),
        }];

        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Learn);
        assert_eq!(resolution.rule, "activity-history");
    }

    #[test]
    fn test_default_is_detect() {
        let fx = Fixture::default();
        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Detect);
        assert_eq!(resolution.rule, "default");
        assert!(!resolution.is_complete);
    }

    #[test]
    fn test_detection_complete_each_disjunct() {
        // Disjunct 1: status settled away from detecting.
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            status: DetectionStatus::NoFriction,
            ..Default::default()
        });
        assert!(detection_complete(&fx.inputs()));

        // Disjunct 2: stats completion flag alone.
        let mut fx = Fixture::default();
        fx.stats = Some(LiveStatsSnapshot {
            detection_complete: true,
            ..Default::default()
        });
        assert!(detection_complete(&fx.inputs()));

        // Disjunct 3: decision_ready phase alone.
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            phase: DetectionPhase::DecisionReady,
            status: DetectionStatus::Detecting,
            ..Default::default()
        });
        assert!(detection_complete(&fx.inputs()));

        // None of the above: still running.
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            phase: DetectionPhase::FrictionIdentified,
            status: DetectionStatus::Detecting,
            ..Default::default()
        });
        assert!(!detection_complete(&fx.inputs()));
    }

    #[test]
    fn test_completion_latch_survives_source_disagreement() {
        let mut fx = Fixture::default();
        fx.cycle.latch_complete();
        // All sources now claim in-progress; the latch still reports complete.
        fx.detection = Some(DetectionSnapshot {
            status: DetectionStatus::Detecting,
            ..Default::default()
        });

        let resolution = resolve(&fx.inputs());
        assert!(resolution.is_complete);

        // Only an explicit new cycle clears it.
        fx.cycle.begin_cycle();
        let resolution = resolve(&fx.inputs());
        assert!(!resolution.is_complete);
    }

    #[test]
    fn test_unvalidated_completion_ignores_learn_floor() {
        let mut fx = Fixture::default();
        fx.cycle.observe(&Resolution {
            phase: Phase::Learn,
            is_complete: false,
            rule: "test",
            overrode_floor: false,
        });
        fx.local.lifecycle = LifecycleStage::Complete;
        fx.local.execution_result = Some(unvalidated_result());

        // Floor says learn, but an unvalidated result must not claim it.
        let resolution = resolve(&fx.inputs());
        assert_eq!(resolution.phase, Phase::Prove);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut fx = Fixture::default();
        fx.detection = Some(DetectionSnapshot {
            status: DetectionStatus::FrictionFound,
            complete: true,
            execution_status: ExecutionStatus::AwaitingApproval,
            ..Default::default()
        });
        fx.local.activity = vec![ActivityItem {
            id: "a1".to_string(),
            timestamp: Utc::now(),
            phase: Phase::Decide,
            message: String::new(),
        }];

        let first = resolve(&fx.inputs());
        let second = resolve(&fx.inputs());
        assert_eq!(first, second);
    }
}
