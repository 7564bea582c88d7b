//! Stuck-state watchdogs.
//!
//! Three named timers guard against a backend that stops making progress:
//! `running` (execution stuck mid-flight), `awaiting-approval` (an approval
//! nobody is acting on), and `detection` (a cycle that never reports
//! completion). Firing is never fatal: the reconciler forces a refetch and
//! surfaces a soft notice, or locally completes a hung detection.
//!
//! Deadline-based like the lifecycle controller: the reconciler's select
//! loop asks for the earliest deadline and calls back when it elapses.

use tokio::time::Instant;
use tracing::warn;

use crate::domain::models::{ExecutionStatus, WatchdogConfig};

/// Which watchdog fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogKind {
    /// `running` persisted past its threshold.
    Running,
    /// `awaiting_approval` persisted past its threshold.
    AwaitingApproval,
    /// A detection cycle exceeded its completion deadline.
    Detection,
}

impl WatchdogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::AwaitingApproval => "awaiting-approval",
            Self::Detection => "detection",
        }
    }
}

/// Wall-clock guards over externally-observed status.
#[derive(Debug)]
pub struct WatchdogService {
    config: WatchdogConfig,
    observed: Option<ExecutionStatus>,
    status_deadline: Option<(WatchdogKind, Instant)>,
    detection_deadline: Option<Instant>,
}

impl WatchdogService {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            observed: None,
            status_deadline: None,
            detection_deadline: None,
        }
    }

    /// Feed the latest derived execution status. Any change re-arms the
    /// matching watchdog from zero; an unchanged status leaves the running
    /// clock alone.
    pub fn observe_status(&mut self, status: ExecutionStatus) {
        if self.observed == Some(status) {
            return;
        }
        self.observed = Some(status);
        self.status_deadline = match status {
            ExecutionStatus::Running => Some((
                WatchdogKind::Running,
                Instant::now() + std::time::Duration::from_millis(self.config.running_ms),
            )),
            ExecutionStatus::AwaitingApproval => Some((
                WatchdogKind::AwaitingApproval,
                Instant::now() + std::time::Duration::from_millis(self.config.approval_ms),
            )),
            _ => None,
        };
    }

    /// Arm the detection watchdog when a cycle starts.
    pub fn detection_started(&mut self) {
        self.detection_deadline = Some(
            Instant::now() + std::time::Duration::from_millis(self.config.detection_timeout_ms),
        );
    }

    /// Disarm the detection watchdog once the cycle reports completion.
    pub fn detection_settled(&mut self) {
        self.detection_deadline = None;
    }

    /// Earliest armed deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        let status = self.status_deadline.map(|(_, at)| at);
        match (status, self.detection_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire whichever watchdog is due. Status watchdogs re-arm for another
    /// full interval (a still-stuck backend keeps getting nudged); the
    /// detection watchdog disarms after its one forced completion.
    pub fn on_deadline(&mut self) -> Option<WatchdogKind> {
        let now = Instant::now();

        if let Some(at) = self.detection_deadline {
            if at <= now {
                self.detection_deadline = None;
                warn!(watchdog = "detection", "detection cycle exceeded deadline, forcing completion");
                return Some(WatchdogKind::Detection);
            }
        }

        if let Some((kind, at)) = self.status_deadline {
            if at <= now {
                let interval = match kind {
                    WatchdogKind::Running => self.config.running_ms,
                    WatchdogKind::AwaitingApproval => self.config.approval_ms,
                    WatchdogKind::Detection => unreachable!("detection handled above"),
                };
                self.status_deadline =
                    Some((kind, now + std::time::Duration::from_millis(interval)));
                warn!(watchdog = kind.as_str(), "status unchanged past threshold, forcing refresh");
                return Some(kind);
            }
        }

        None
    }
}
