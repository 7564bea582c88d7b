//! Execution lifecycle controller.
//!
//! After an approval, the backend can be slow to publish authoritative
//! execution phases. This controller runs the optimistic fallback
//! `idle -> execute -> prove -> learn -> complete` on fixed dwell timers,
//! and is suspended the moment the backend starts reporting its own phase.
//!
//! The controller owns no task of its own. It exposes the next deadline
//! and a callback for when that deadline is reached; the reconciler's
//! select loop drives it. That keeps every timer cancellable by dropping
//! the loop, and makes the controller fully deterministic under paused
//! test time.

use tokio::time::Instant;
use tracing::debug;

use crate::domain::models::{CompletePolicy, LifecycleConfig, LifecycleStage};

/// What happened when a lifecycle deadline fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Advanced one stage (execute -> prove -> learn).
    Advanced(LifecycleStage),
    /// Reached `complete`. Carries the approved action id so the caller can
    /// record it as client-completed.
    Completed { action_id: Option<String> },
    /// An `AutoReset` fired: the lifecycle went back to idle and the caller
    /// should refetch authoritative state from every source.
    ResetRequested,
}

/// Dwell-timer state machine for the post-approval sub-lifecycle.
#[derive(Debug)]
pub struct LifecycleController {
    config: LifecycleConfig,
    stage: LifecycleStage,
    action_id: Option<String>,
    deadline: Option<Instant>,
    /// While the backend reports an authoritative execution phase the dwell
    /// timers are parked.
    suspended: bool,
}

impl LifecycleController {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            stage: LifecycleStage::Idle,
            action_id: None,
            deadline: None,
            suspended: false,
        }
    }

    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    pub fn action_id(&self) -> Option<&str> {
        self.action_id.as_deref()
    }

    /// Start the lifecycle for a freshly-approved action.
    pub fn begin(&mut self, action_id: impl Into<String>) {
        self.stage = LifecycleStage::Execute;
        self.action_id = Some(action_id.into());
        self.arm_dwell();
        debug!(stage = %self.stage, "local lifecycle started");
    }

    /// Reset to idle. Called when a new detection cycle begins or the
    /// approved action fully completes on the backend side.
    pub fn reset(&mut self) {
        self.stage = LifecycleStage::Idle;
        self.action_id = None;
        self.deadline = None;
        self.suspended = false;
    }

    /// Park or resume the dwell timers as backend authority comes and goes.
    pub fn set_backend_active(&mut self, backend_active: bool) {
        if backend_active == self.suspended {
            return;
        }
        self.suspended = backend_active;
        if backend_active {
            self.deadline = None;
        } else if self.stage.is_active() {
            // Backend went quiet mid-lifecycle: restart the dwell clock.
            self.arm_dwell();
        }
    }

    /// The next instant at which [`Self::on_deadline`] wants to run.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Advance the state machine after its deadline elapsed.
    pub fn on_deadline(&mut self) -> Option<LifecycleEvent> {
        self.deadline?;
        self.deadline = None;

        match self.stage {
            LifecycleStage::Idle => None,
            LifecycleStage::Execute | LifecycleStage::Prove | LifecycleStage::Learn => {
                let next = self.stage.advanced();
                self.stage = next;
                if next == LifecycleStage::Complete {
                    match self.config.complete_policy {
                        CompletePolicy::Hold => {
                            // Stays complete until an external reset.
                        }
                        CompletePolicy::AutoReset => {
                            self.deadline = Some(Instant::now() + self.config.reset_delay());
                        }
                    }
                    debug!(action_id = ?self.action_id, "local lifecycle complete");
                    Some(LifecycleEvent::Completed {
                        action_id: self.action_id.clone(),
                    })
                } else {
                    self.arm_dwell();
                    debug!(stage = %next, "local lifecycle advanced");
                    Some(LifecycleEvent::Advanced(next))
                }
            }
            LifecycleStage::Complete => {
                // Only reachable under AutoReset.
                self.reset();
                Some(LifecycleEvent::ResetRequested)
            }
        }
    }

    fn arm_dwell(&mut self) {
        if !self.suspended {
            self.deadline = Some(Instant::now() + self.config.dwell());
        }
    }
}
