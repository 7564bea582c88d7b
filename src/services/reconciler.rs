//! Reconciler service.
//!
//! The single-writer event loop that owns all reconciled state. Poll ticks,
//! stream signals, lifecycle deadlines, watchdog firings, and user commands
//! all funnel into one `tokio::select!`; after every mutation the resolver
//! recomputes the phase and subscribers get a broadcast update.
//!
//! Concurrency model: cooperative, single task. There is no lock around the
//! reconciled state because nothing else can touch it; "last write wins per
//! source, then priority-ranked read" is the only interleaving rule. Every
//! timer lives inside the loop, so dropping the loop (shutdown signal or
//! abort) tears down all of them at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::models::{
    ActivityItem, Config, DetectionPhase, DetectionSnapshot, ExecutionPhase, ExecutionResult,
    ExecutionStatus, LifecycleConfig, LiveStatsSnapshot, PollingConfig, StoreReadiness,
    StreamEvent, WatchdogConfig,
};
use crate::domain::ports::BackendApi;
use crate::services::lifecycle::{LifecycleController, LifecycleEvent};
use crate::services::resolver::{self, CycleState, LocalState, ResolveInputs, Resolution};
use crate::services::scheduler::{PollKind, PollScheduler, ScheduleView};
use crate::services::watchdog::{WatchdogKind, WatchdogService};

/// Signals produced by the stream adapter.
#[derive(Debug, Clone)]
pub enum StreamSignal {
    /// Connection (re-)established.
    Connected,
    /// Connection lost; the adapter is backing off before retrying.
    Reconnecting,
    /// One parsed push event.
    Event(StreamEvent),
}

/// Commands accepted by the reconciler.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start a new detection cycle.
    TriggerDetect,
    /// Approve the committed action.
    Approve {
        /// Opaque action id; `foundational_`-prefixed ids route differently.
        action_id: String,
    },
    /// Force an immediate refetch of every signal source.
    Refresh,
}

/// Category of a soft notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A status watchdog forced a refresh.
    StuckState,
    /// The detection watchdog forced local completion.
    DetectionTimeout,
    /// An approve-action mutation failed; the merchant must re-invoke.
    ApprovalFailed,
    /// The stream dropped and is reconnecting.
    StreamReconnecting,
}

/// Updates broadcast to subscribers (the CLI shell, tests).
#[derive(Debug, Clone)]
pub enum LoopUpdate {
    /// The resolution changed.
    Phase {
        /// Resolver verdict.
        resolution: Resolution,
        /// Backend detection sub-stage, for narration.
        detection_stage: Option<DetectionPhase>,
    },
    /// A stream event arrived.
    Activity(StreamEvent),
    /// A non-fatal notice worth surfacing.
    Notice {
        kind: NoticeKind,
        message: String,
    },
    /// An approval completed with this result.
    ExecutionOutcome(ExecutionResult),
}

/// Configuration for the reconciler loop.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub polling: PollingConfig,
    pub lifecycle: LifecycleConfig,
    pub watchdog: WatchdogConfig,
    /// Capacity of the update broadcast channel.
    pub channel_capacity: usize,
    /// How much activity history to load at startup.
    pub activity_history_limit: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            polling: PollingConfig::default(),
            lifecycle: LifecycleConfig::default(),
            watchdog: WatchdogConfig::default(),
            channel_capacity: 256,
            activity_history_limit: 50,
        }
    }
}

impl From<&Config> for ReconcilerConfig {
    fn from(config: &Config) -> Self {
        Self {
            polling: config.polling.clone(),
            lifecycle: config.lifecycle.clone(),
            watchdog: config.watchdog.clone(),
            ..Self::default()
        }
    }
}

/// Handle to a spawned reconciler.
///
/// Dropping the shutdown sender (or calling [`Self::abort`]) cancels the
/// loop and with it every timer and in-flight fetch it owns.
pub struct ReconcilerHandle {
    command_tx: mpsc::Sender<Command>,
    update_tx: broadcast::Sender<LoopUpdate>,
    join: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Subscribe to loop updates.
    pub fn subscribe(&self) -> broadcast::Receiver<LoopUpdate> {
        self.update_tx.subscribe()
    }

    /// Sender for commands into the loop.
    pub fn commands(&self) -> mpsc::Sender<Command> {
        self.command_tx.clone()
    }

    /// Wait for the loop to exit.
    pub async fn join(self) {
        let _ = self.join.await;
    }

    /// Hard-cancel the loop.
    pub fn abort(&self) {
        self.join.abort();
    }

    /// Whether the loop task has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// The reconciler: builder for the spawned loop.
pub struct Reconciler {
    backend: Arc<dyn BackendApi>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn BackendApi>, config: ReconcilerConfig) -> Self {
        Self { backend, config }
    }

    /// Spawn the loop. `stream_rx` carries signals from the stream adapter;
    /// a message on `shutdown_rx` ends the loop gracefully.
    pub fn spawn(
        self,
        stream_rx: mpsc::Receiver<StreamSignal>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> ReconcilerHandle {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (update_tx, _) = broadcast::channel(self.config.channel_capacity);

        let mut inner = ReconcilerLoop {
            backend: self.backend,
            update_tx: update_tx.clone(),
            lifecycle: LifecycleController::new(self.config.lifecycle.clone()),
            watchdogs: WatchdogService::new(self.config.watchdog.clone()),
            scheduler: PollScheduler::new(self.config.polling.clone()),
            activity_history_limit: self.config.activity_history_limit,
            detection: None,
            stats: None,
            stream_events: Vec::new(),
            stream_connected: false,
            stream_open: true,
            local: LocalState::default(),
            cycle: CycleState::default(),
            store_ready: StoreReadiness::Pending,
            pending_result: None,
            readiness_check_at: None,
            detection_was_running: false,
            last_published: None,
        };

        let join = tokio::spawn(async move {
            inner.run(command_rx, stream_rx, shutdown_rx).await;
        });

        ReconcilerHandle {
            command_tx,
            update_tx,
            join,
        }
    }
}

/// How long to park a select arm that currently has no deadline.
const PARKED: Duration = Duration::from_secs(3600);

struct ReconcilerLoop {
    backend: Arc<dyn BackendApi>,
    update_tx: broadcast::Sender<LoopUpdate>,
    lifecycle: LifecycleController,
    watchdogs: WatchdogService,
    scheduler: PollScheduler,
    activity_history_limit: usize,

    detection: Option<DetectionSnapshot>,
    stats: Option<LiveStatsSnapshot>,
    stream_events: Vec<StreamEvent>,
    stream_connected: bool,
    stream_open: bool,
    local: LocalState,
    cycle: CycleState,
    store_ready: StoreReadiness,
    /// Result of an approval whose execution has not yet settled. Only once
    /// the local lifecycle completes (or the backend reports completion) does
    /// it become the "prior execution result" the resolver consults; settling
    /// it immediately would skip the execute/prove progression.
    pending_result: Option<ExecutionResult>,
    readiness_check_at: Option<Instant>,
    detection_was_running: bool,
    last_published: Option<(Resolution, Option<DetectionPhase>)>,
}

impl ReconcilerLoop {
    async fn run(
        &mut self,
        mut command_rx: mpsc::Receiver<Command>,
        mut stream_rx: mpsc::Receiver<StreamSignal>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        self.startup().await;
        info!(store_ready = ?self.store_ready, "reconciler started");

        loop {
            self.reconcile();

            let next_poll = self.scheduler.next_due();
            let poll_at = next_poll.map_or_else(|| Instant::now() + PARKED, |(_, at)| at);
            let lifecycle_deadline = self.lifecycle.next_deadline();
            let lifecycle_at = lifecycle_deadline.unwrap_or_else(|| Instant::now() + PARKED);
            let watchdog_deadline = self.watchdogs.next_deadline();
            let watchdog_at = watchdog_deadline.unwrap_or_else(|| Instant::now() + PARKED);

            if self.store_ready.is_ready() {
                self.readiness_check_at = None;
            } else if self.readiness_check_at.is_none() {
                self.readiness_check_at = Some(Instant::now() + Duration::from_secs(5));
            }
            let readiness_at = self
                .readiness_check_at
                .unwrap_or_else(|| Instant::now() + PARKED);

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("reconciler shutting down");
                    break;
                }
                cmd = command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                signal = stream_rx.recv(), if self.stream_open => match signal {
                    Some(signal) => self.handle_stream_signal(signal),
                    None => {
                        self.stream_open = false;
                        self.stream_connected = false;
                    }
                },
                () = sleep_until(poll_at), if next_poll.is_some() => {
                    if let Some((kind, _)) = next_poll {
                        self.poll(kind).await;
                    }
                }
                () = sleep_until(lifecycle_at), if lifecycle_deadline.is_some() => {
                    self.handle_lifecycle_deadline();
                }
                () = sleep_until(watchdog_at), if watchdog_deadline.is_some() => {
                    self.handle_watchdog_deadline().await;
                }
                () = sleep_until(readiness_at), if self.readiness_check_at.is_some() => {
                    self.readiness_check_at = None;
                    self.refresh_readiness().await;
                }
            }
        }
    }

    /// One-time startup fetches: store readiness and activity history.
    async fn startup(&mut self) {
        self.refresh_readiness().await;

        match self.backend.activity_feed(self.activity_history_limit).await {
            Ok(items) => self.local.activity = items,
            Err(err) => debug!(error = %err, "activity history unavailable at startup"),
        }
    }

    /// Recompute the resolution and propagate derived facts into the
    /// scheduler, watchdogs, and lifecycle suspension. Publishes a phase
    /// update when the verdict changed.
    fn reconcile(&mut self) {
        self.local.lifecycle = self.lifecycle.stage();

        // Backend-confirmed completion settles a pending approval result.
        let backend_completed = self
            .detection
            .as_ref()
            .map(|d| d.execution_phase)
            .or_else(|| self.stats.as_ref().map(|s| s.execution_phase))
            == Some(ExecutionPhase::Completed);
        if backend_completed && self.local.execution_result.is_none() {
            if let Some(result) = self.pending_result.take() {
                self.local.execution_result = Some(result);
            }
        }

        let inputs = self.inputs();
        let resolution = resolver::resolve(&inputs);
        let derived = resolver::derived_execution_status(&inputs);
        let detection_running = resolver::detection_running(&inputs);
        let backend_active = inputs
            .detection
            .map(|d| d.execution_phase)
            .or_else(|| inputs.stats.map(|s| s.execution_phase))
            .is_some_and(|p| p.is_active());

        self.cycle.observe(&resolution);
        self.watchdogs.observe_status(derived);
        // Arm the detection watchdog on a cycle's rising edge; completion is
        // the only thing that disarms it.
        if detection_running && !self.detection_was_running {
            self.watchdogs.detection_started();
        }
        self.detection_was_running = detection_running;
        if resolution.is_complete {
            self.watchdogs.detection_settled();
        }
        self.lifecycle.set_backend_active(backend_active);
        self.scheduler.reconfigure(ScheduleView {
            store_ready: self.store_ready.is_ready(),
            detection_running,
            execution_active: derived == ExecutionStatus::Running
                || self.lifecycle.stage().is_active(),
        });

        let detection_stage = self.detection.as_ref().map(|d| d.phase);
        if self.last_published != Some((resolution, detection_stage)) {
            self.last_published = Some((resolution, detection_stage));
            debug!(
                cycle_id = %self.cycle.cycle_id(),
                phase = %resolution.phase,
                rule = resolution.rule,
                complete = resolution.is_complete,
                "phase resolved"
            );
            let _ = self.update_tx.send(LoopUpdate::Phase {
                resolution,
                detection_stage,
            });
        }
    }

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

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::TriggerDetect => self.trigger_detect().await,
            Command::Approve { action_id } => self.approve(&action_id).await,
            Command::Refresh => {
                self.scheduler.force_all_due();
                self.refresh_readiness().await;
            }
        }
    }

    /// Start a new detection cycle: the one place the completion latch and
    /// the monotonicity floor are cleared, and the local action lifecycle
    /// is destroyed.
    async fn trigger_detect(&mut self) {
        self.cycle.begin_cycle();
        self.lifecycle.reset();
        self.local.execution_result = None;
        self.pending_result = None;
        self.local.detecting = true;
        // Drop the previous cycle's snapshots: their settled status must not
        // re-latch the fresh cycle as complete before the backend reports in.
        self.detection = None;
        self.stats = None;
        self.detection_was_running = true;
        self.watchdogs.detection_started();
        self.scheduler.force_all_due();

        match self.backend.trigger_detect().await {
            Ok(()) => {
                // Response only clears the optimistic flag; polling reports
                // actual progress from here.
                self.local.detecting = false;
                info!(cycle_id = %self.cycle.cycle_id(), "detection cycle triggered");
            }
            Err(err) => {
                self.local.detecting = false;
                self.watchdogs.detection_settled();
                warn!(error = %err, "detect trigger failed");
                self.notify(NoticeKind::StuckState, format!("detect trigger failed: {err}"));
            }
        }
    }

    /// Approve an action. Failure is surfaced and NOT retried; the merchant
    /// must re-invoke.
    async fn approve(&mut self, action_id: &str) {
        match self.backend.approve_action(action_id).await {
            Ok(result) => {
                info!(
                    action_id,
                    products = result.products_optimized.len(),
                    changes = result.total_changes,
                    "action approved"
                );
                let _ = self
                    .update_tx
                    .send(LoopUpdate::ExecutionOutcome(result.clone()));
                self.pending_result = Some(result);
                self.lifecycle.begin(action_id);
            }
            Err(err) => {
                error!(action_id, error = %err, "approve-action failed");
                self.notify(
                    NoticeKind::ApprovalFailed,
                    format!("approval of {action_id} failed: {err}"),
                );
            }
        }
    }

    fn handle_stream_signal(&mut self, signal: StreamSignal) {
        match signal {
            StreamSignal::Connected => {
                self.stream_connected = true;
                debug!("stream connected");
            }
            StreamSignal::Reconnecting => {
                self.stream_connected = false;
                self.notify(
                    NoticeKind::StreamReconnecting,
                    "activity stream reconnecting".to_string(),
                );
            }
            StreamSignal::Event(event) => {
                debug!(event_type = %event.event_type, "stream event");
                let _ = self.update_tx.send(LoopUpdate::Activity(event.clone()));
                self.stream_events.push(event);
            }
        }
    }

    fn handle_lifecycle_deadline(&mut self) {
        match self.lifecycle.on_deadline() {
            Some(LifecycleEvent::Advanced(_)) => {}
            Some(LifecycleEvent::Completed { action_id }) => {
                if let Some(id) = action_id {
                    self.local.completed_action_ids.insert(id);
                }
                if let Some(result) = self.pending_result.take() {
                    self.local.execution_result = Some(result);
                }
            }
            Some(LifecycleEvent::ResetRequested) => {
                // Auto-reset wants fresh authoritative state.
                self.scheduler.force_all_due();
            }
            None => {}
        }
    }

    async fn handle_watchdog_deadline(&mut self) {
        match self.watchdogs.on_deadline() {
            Some(WatchdogKind::Detection) => {
                // A hung backend must not block the loop: complete locally.
                self.cycle.latch_complete();
                self.local.detecting = false;
                self.notify(
                    NoticeKind::DetectionTimeout,
                    "detection did not finish in time; showing last known state".to_string(),
                );
            }
            Some(kind @ (WatchdogKind::Running | WatchdogKind::AwaitingApproval)) => {
                self.scheduler.force_all_due();
                self.refresh_readiness().await;
                self.notify(
                    NoticeKind::StuckState,
                    format!("no progress from backend ({}); refreshing", kind.as_str()),
                );
            }
            None => {}
        }
    }

    async fn poll(&mut self, kind: PollKind) {
        self.scheduler.mark_polled(kind);
        match kind {
            PollKind::Detection => match self.backend.detection_status().await {
                Ok(snapshot) => {
                    if snapshot.complete {
                        // complete is monotonic per cycle: latch it.
                        self.cycle.latch_complete();
                    }
                    self.detection = Some(snapshot);
                }
                Err(err) => {
                    // Stale-but-available: keep the previous snapshot.
                    debug!(error = %err, "detection poll failed");
                }
            },
            PollKind::Stats => match self.backend.live_stats().await {
                Ok(snapshot) => {
                    if snapshot.detection_complete {
                        self.cycle.latch_complete();
                    }
                    self.stats = Some(snapshot);
                }
                Err(err) => {
                    debug!(error = %err, "stats poll failed");
                }
            },
            PollKind::Activity => match self.backend.execution_activities().await {
                Ok(items) => self.merge_activity(items),
                Err(err) => {
                    debug!(error = %err, "activity poll failed");
                }
            },
        }
    }

    /// Append unseen activity items, preserving arrival order.
    fn merge_activity(&mut self, items: Vec<ActivityItem>) {
        for item in items {
            if !self.local.activity.iter().any(|known| known.id == item.id) {
                self.local.activity.push(item);
            }
        }
    }

    async fn refresh_readiness(&mut self) {
        match self.backend.store_readiness().await {
            Ok(readiness) => {
                if readiness != self.store_ready {
                    info!(readiness = ?readiness, "store readiness changed");
                }
                self.store_ready = readiness;
            }
            Err(err) => debug!(error = %err, "store readiness check failed"),
        }
    }

    fn notify(&self, kind: NoticeKind, message: String) {
        let _ = self.update_tx.send(LoopUpdate::Notice { kind, message });
    }
}
