//! Poll scheduler.
//!
//! Owns the named polling timers (`detection`, `stats`, `activity`) and
//! nothing else. Cadence changes are driven only by resolved-state
//! transitions fed through [`PollScheduler::reconfigure`], never by ad hoc
//! callers, so the polling behavior is a pure function of reconciled state:
//!
//! - detection: 1 s while a cycle runs, 5 s idle, off unless the store is ready
//! - stats: fixed 5 s whenever the store is ready
//! - activity: 800 ms only while an execution is active

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::domain::models::PollingConfig;

/// Named polling timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// detection-status endpoint.
    Detection,
    /// live-stats endpoint.
    Stats,
    /// execution-activities endpoint.
    Activity,
}

impl PollKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detection => "detection-poll",
            Self::Stats => "stats-poll",
            Self::Activity => "activity-poll",
        }
    }
}

/// The reconciled-state facts the scheduler keys its cadences off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleView {
    /// Store readiness gate.
    pub store_ready: bool,
    /// A detection cycle is actively running.
    pub detection_running: bool,
    /// An execution is active (backend running, or local lifecycle in flight).
    pub execution_active: bool,
}

#[derive(Debug, Default)]
struct Slot {
    period: Option<Duration>,
    next_at: Option<Instant>,
}

impl Slot {
    /// Apply a desired period. Enabling or changing cadence schedules an
    /// immediate poll; disabling clears the timer.
    fn set_period(&mut self, period: Option<Duration>) -> bool {
        if self.period == period {
            return false;
        }
        self.period = period;
        self.next_at = period.map(|_| Instant::now());
        true
    }

    fn mark_polled(&mut self) {
        self.next_at = self.period.map(|p| Instant::now() + p);
    }
}

/// Scheduler for the three REST polling timers.
#[derive(Debug)]
pub struct PollScheduler {
    config: PollingConfig,
    detection: Slot,
    stats: Slot,
    activity: Slot,
}

impl PollScheduler {
    pub fn new(config: PollingConfig) -> Self {
        Self {
            config,
            detection: Slot::default(),
            stats: Slot::default(),
            activity: Slot::default(),
        }
    }

    /// Recompute desired cadences from reconciled state. Idempotent: calling
    /// with an unchanged view leaves every timer untouched.
    pub fn reconfigure(&mut self, view: ScheduleView) {
        let detection_period = if view.store_ready {
            Some(Duration::from_millis(if view.detection_running {
                self.config.detection_active_ms
            } else {
                self.config.detection_idle_ms
            }))
        } else {
            None
        };
        let stats_period = view
            .store_ready
            .then(|| Duration::from_millis(self.config.stats_ms));
        let activity_period = view
            .execution_active
            .then(|| Duration::from_millis(self.config.activity_ms));

        if self.detection.set_period(detection_period) {
            debug!(timer = PollKind::Detection.as_str(), period = ?detection_period, "poll cadence changed");
        }
        if self.stats.set_period(stats_period) {
            debug!(timer = PollKind::Stats.as_str(), period = ?stats_period, "poll cadence changed");
        }
        if self.activity.set_period(activity_period) {
            debug!(timer = PollKind::Activity.as_str(), period = ?activity_period, "poll cadence changed");
        }
    }

    /// The earliest scheduled poll, if any timer is enabled.
    pub fn next_due(&self) -> Option<(PollKind, Instant)> {
        [
            (PollKind::Detection, self.detection.next_at),
            (PollKind::Stats, self.stats.next_at),
            (PollKind::Activity, self.activity.next_at),
        ]
        .into_iter()
        .filter_map(|(kind, at)| at.map(|at| (kind, at)))
        .min_by_key(|(_, at)| *at)
    }

    /// Record that a poll for `kind` was just issued.
    pub fn mark_polled(&mut self, kind: PollKind) {
        match kind {
            PollKind::Detection => self.detection.mark_polled(),
            PollKind::Stats => self.stats.mark_polled(),
            PollKind::Activity => self.activity.mark_polled(),
        }
    }

    /// Pull every enabled timer forward to now (watchdog-forced refresh).
    pub fn force_all_due(&mut self) {
        let now = Instant::now();
        for slot in [&mut self.detection, &mut self.stats, &mut self.activity] {
            if slot.period.is_some() {
                slot.next_at = Some(now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> PollScheduler {
        PollScheduler::new(PollingConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_not_ready_disables_rest_polling() {
        let mut sched = scheduler();
        sched.reconfigure(ScheduleView::default());
        assert!(sched.next_due().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_enables_immediate_detection_and_stats() {
        let mut sched = scheduler();
        sched.reconfigure(ScheduleView {
            store_ready: true,
            ..Default::default()
        });

        let (_, at) = sched.next_due().expect("due");
        assert_eq!(at, Instant::now());

        // After polling both, detection idles at 5 s like stats.
        sched.mark_polled(PollKind::Detection);
        sched.mark_polled(PollKind::Stats);
        let (_, at) = sched.next_due().expect("due");
        assert_eq!(
            at.duration_since(Instant::now()),
            Duration::from_millis(5_000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_cycle_tightens_detection_cadence() {
        let mut sched = scheduler();
        sched.reconfigure(ScheduleView {
            store_ready: true,
            detection_running: true,
            ..Default::default()
        });
        sched.mark_polled(PollKind::Detection);
        sched.mark_polled(PollKind::Stats);

        let (kind, at) = sched.next_due().expect("due");
        assert_eq!(kind, PollKind::Detection);
        assert_eq!(
            at.duration_since(Instant::now()),
            Duration::from_millis(1_000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_polling_only_while_executing() {
        let mut sched = scheduler();
        let view = ScheduleView {
            store_ready: true,
            detection_running: false,
            execution_active: true,
        };
        sched.reconfigure(view);
        sched.mark_polled(PollKind::Detection);
        sched.mark_polled(PollKind::Stats);
        sched.mark_polled(PollKind::Activity);

        let (kind, at) = sched.next_due().expect("due");
        assert_eq!(kind, PollKind::Activity);
        assert_eq!(
            at.duration_since(Instant::now()),
            Duration::from_millis(800)
        );

        // Execution ends: activity timer stops.
        sched.reconfigure(ScheduleView {
            execution_active: false,
            ..view
        });
        let (kind, _) = sched.next_due().expect("due");
        assert_ne!(kind, PollKind::Activity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_is_idempotent() {
        let mut sched = scheduler();
        let view = ScheduleView {
            store_ready: true,
            ..Default::default()
        };
        sched.reconfigure(view);
        sched.mark_polled(PollKind::Detection);
        sched.mark_polled(PollKind::Stats);
        let before = sched.next_due();

        // Same view again must not reset any timer to "now".
        sched.reconfigure(view);
        assert_eq!(sched.next_due(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_all_due() {
        let mut sched = scheduler();
        sched.reconfigure(ScheduleView {
            store_ready: true,
            ..Default::default()
        });
        sched.mark_polled(PollKind::Detection);
        sched.mark_polled(PollKind::Stats);

        sched.force_all_due();
        let (_, at) = sched.next_due().expect("due");
        assert_eq!(at, Instant::now());
    }
}
