//! End-to-end reconciler tests.
//!
//! All tests run under paused tokio time, so dwell timers, polling
//! cadences, and watchdog thresholds elapse deterministically.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use common::{stream_event, unvalidated_result, validated_result, FakeBackend};
use zyra::domain::models::{
    DetectionPhase, DetectionSnapshot, DetectionStatus, ExecutionPhase, ExecutionStatus, Phase,
};
use zyra::services::reconciler::{
    Command, LoopUpdate, NoticeKind, Reconciler, ReconcilerConfig, ReconcilerHandle, StreamSignal,
};

struct Harness {
    backend: Arc<FakeBackend>,
    handle: ReconcilerHandle,
    stream_tx: mpsc::Sender<StreamSignal>,
    shutdown_tx: broadcast::Sender<()>,
}

fn spawn(backend: FakeBackend) -> Harness {
    let backend = Arc::new(backend);
    let (shutdown_tx, _) = broadcast::channel(1);
    let (stream_tx, stream_rx) = mpsc::channel(64);
    let handle = Reconciler::new(backend.clone(), ReconcilerConfig::default())
        .spawn(stream_rx, shutdown_tx.subscribe());
    Harness {
        backend,
        handle,
        stream_tx,
        shutdown_tx,
    }
}

const WAIT: Duration = Duration::from_secs(300);

/// Wait for a phase resolution matching the predicate.
async fn wait_for_phase(
    rx: &mut broadcast::Receiver<LoopUpdate>,
    predicate: impl Fn(Phase, bool) -> bool,
) -> (Phase, bool, &'static str) {
    timeout(WAIT, async {
        loop {
            if let LoopUpdate::Phase { resolution, .. } = rx.recv().await.expect("updates closed") {
                if predicate(resolution.phase, resolution.is_complete) {
                    return (resolution.phase, resolution.is_complete, resolution.rule);
                }
            }
        }
    })
    .await
    .expect("phase predicate not met in time")
}

/// Wait for a notice of the given kind.
async fn wait_for_notice(rx: &mut broadcast::Receiver<LoopUpdate>, wanted: NoticeKind) -> String {
    timeout(WAIT, async {
        loop {
            if let LoopUpdate::Notice { kind, message } = rx.recv().await.expect("updates closed") {
                if kind == wanted {
                    return message;
                }
            }
        }
    })
    .await
    .expect("notice not observed in time")
}

fn decision_ready_snapshot() -> DetectionSnapshot {
    DetectionSnapshot {
        phase: DetectionPhase::DecisionReady,
        status: DetectionStatus::FrictionFound,
        complete: true,
        committed_action_id: Some("opp-42".to_string()),
        execution_status: ExecutionStatus::AwaitingApproval,
        execution_phase: ExecutionPhase::Idle,
    }
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_detect_decide_execute_prove_learn() {
    let backend = FakeBackend::default();
    backend.set_detection(decision_ready_snapshot());
    backend.set_approve_ok(validated_result("Rewrite thin titles"));

    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    // Detection reports friction_found/complete: decide, cycle complete.
    let (phase, complete, _) = wait_for_phase(&mut rx, |p, c| p == Phase::Decide && c).await;
    assert_eq!(phase, Phase::Decide);
    assert!(complete);

    // Approve. The optimistic lifecycle must walk execute -> prove -> learn
    // in exactly that order, never skipping or reverting.
    harness
        .handle
        .commands()
        .send(Command::Approve {
            action_id: "opp-42".to_string(),
        })
        .await
        .unwrap();

    let mut observed = Vec::new();
    timeout(WAIT, async {
        loop {
            if let LoopUpdate::Phase { resolution, .. } = rx.recv().await.expect("closed") {
                if observed.last() != Some(&resolution.phase) {
                    observed.push(resolution.phase);
                }
                if resolution.phase == Phase::Learn {
                    break;
                }
            }
        }
    })
    .await
    .expect("lifecycle did not reach learn");

    assert_eq!(observed, vec![Phase::Execute, Phase::Prove, Phase::Learn]);

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_unvalidated_result_settles_in_prove() {
    let backend = FakeBackend::default();
    backend.set_detection(decision_ready_snapshot());
    backend.set_approve_ok(unvalidated_result("No-op action"));

    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    wait_for_phase(&mut rx, |p, _| p == Phase::Decide).await;
    harness
        .handle
        .commands()
        .send(Command::Approve {
            action_id: "opp-42".to_string(),
        })
        .await
        .unwrap();

    // The lifecycle passes through its stages, but once it completes the
    // empty after-value keeps the loop in prove, not learn.
    wait_for_phase(&mut rx, |p, _| p == Phase::Execute).await;
    wait_for_phase(&mut rx, |p, _| p == Phase::Prove).await;

    // Drain updates for the rest of the lifecycle (3 dwells plus the
    // auto-reset) and record the phase the loop settles on.
    let mut settled = Phase::Prove;
    let drain_until = tokio::time::Instant::now() + Duration::from_secs(20);
    loop {
        match tokio::time::timeout_at(drain_until, rx.recv()).await {
            Ok(Ok(LoopUpdate::Phase { resolution, .. })) => settled = resolution.phase,
            Ok(Ok(_)) => {}
            Ok(Err(_)) | Err(_) => break,
        }
    }
    assert_eq!(settled, Phase::Prove, "unvalidated result must not claim learn");

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_approval_failure_surfaces_notice_without_lifecycle() {
    let backend = FakeBackend::default();
    backend.set_detection(decision_ready_snapshot());
    backend.set_approve_err("insufficient credits");

    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    wait_for_phase(&mut rx, |p, _| p == Phase::Decide).await;
    harness
        .handle
        .commands()
        .send(Command::Approve {
            action_id: "opp-42".to_string(),
        })
        .await
        .unwrap();

    let message = wait_for_notice(&mut rx, NoticeKind::ApprovalFailed).await;
    assert!(message.contains("opp-42"));

    // No automatic retry, no optimistic lifecycle: the phase never leaves
    // decide in the window after the failure.
    let drain_until = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        match tokio::time::timeout_at(drain_until, rx.recv()).await {
            Ok(Ok(LoopUpdate::Phase { resolution, .. })) => {
                assert_eq!(resolution.phase, Phase::Decide);
            }
            Ok(Ok(_)) => {}
            Ok(Err(_)) | Err(_) => break,
        }
    }

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_completion_latch_survives_flip_flop() {
    let backend = FakeBackend::default();
    backend.set_detection(DetectionSnapshot {
        status: DetectionStatus::NoFriction,
        complete: true,
        ..Default::default()
    });

    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    wait_for_phase(&mut rx, |_, complete| complete).await;

    // The backend regresses to an in-progress report; the latched cycle
    // must still read complete.
    harness.backend.set_detection(DetectionSnapshot {
        status: DetectionStatus::Detecting,
        complete: false,
        phase: DetectionPhase::FrictionIdentified,
        ..Default::default()
    });
    tokio::time::sleep(Duration::from_secs(12)).await;
    let (_, complete, _) = wait_for_phase(&mut rx, |_, _| true).await;
    assert!(complete, "latch must survive source disagreement");

    // Only an explicit new cycle clears the latch.
    harness
        .handle
        .commands()
        .send(Command::TriggerDetect)
        .await
        .unwrap();
    wait_for_phase(&mut rx, |_, complete| !complete).await;
    assert!(harness.backend.detect_triggers.load(Ordering::SeqCst) >= 1);

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_running_watchdog_forces_refetch() {
    let backend = FakeBackend::default();
    backend.set_detection(DetectionSnapshot {
        status: DetectionStatus::FrictionFound,
        complete: true,
        execution_status: ExecutionStatus::Running,
        execution_phase: ExecutionPhase::Executing,
        committed_action_id: Some("opp-9".to_string()),
        ..Default::default()
    });

    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    wait_for_phase(&mut rx, |p, _| p == Phase::Execute).await;
    let polls_before = harness.backend.detection_polls.load(Ordering::SeqCst);

    // Status never changes: the running watchdog fires at 30 s and forces
    // a refetch of every source.
    let message = wait_for_notice(&mut rx, NoticeKind::StuckState).await;
    assert!(message.contains("running"));
    assert!(harness.backend.detection_polls.load(Ordering::SeqCst) > polls_before);

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_detection_watchdog_forces_local_completion() {
    let backend = FakeBackend::default();
    backend.set_detection(DetectionSnapshot {
        status: DetectionStatus::Detecting,
        phase: DetectionPhase::DetectStarted,
        ..Default::default()
    });

    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    harness
        .handle
        .commands()
        .send(Command::TriggerDetect)
        .await
        .unwrap();

    // Backend never reports completion; at 10 s the loop completes locally
    // instead of hanging.
    let message = wait_for_notice(&mut rx, NoticeKind::DetectionTimeout).await;
    assert!(message.contains("did not finish"));
    wait_for_phase(&mut rx, |_, complete| complete).await;

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_stream_tail_overrides_polled_status() {
    let backend = FakeBackend::default();
    backend.set_detection(decision_ready_snapshot());

    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    wait_for_phase(&mut rx, |p, _| p == Phase::Decide).await;

    // A connected stream's last event wins over awaiting_approval.
    harness.stream_tx.send(StreamSignal::Connected).await.unwrap();
    harness
        .stream_tx
        .send(StreamSignal::Event(stream_event(
            "e1",
            "EXECUTE_APPLY",
            Phase::Execute,
        )))
        .await
        .unwrap();

    let (phase, _, rule) = wait_for_phase(&mut rx, |p, _| p == Phase::Execute).await;
    assert_eq!(phase, Phase::Execute);
    assert_eq!(rule, "stream-tail");

    // Stream drops: polled state says decide, but the floor re-anchored at
    // execute holds; the phase must not revert mid-cycle.
    harness
        .stream_tx
        .send(StreamSignal::Reconnecting)
        .await
        .unwrap();
    wait_for_notice(&mut rx, NoticeKind::StreamReconnecting).await;
    let (phase, _, rule) = wait_for_phase(&mut rx, |_, _| true).await;
    assert_eq!(phase, Phase::Execute);
    assert_ne!(rule, "stream-tail");

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_tears_down_all_timers() {
    let backend = FakeBackend::default();
    let harness = spawn(backend);
    let mut rx = harness.handle.subscribe();

    wait_for_phase(&mut rx, |_, _| true).await;
    tokio::time::sleep(Duration::from_secs(20)).await;

    harness.shutdown_tx.send(()).unwrap();
    harness.handle.join().await;

    // No callback may fire after disposal: poll counters must freeze.
    let detection_after = harness.backend.detection_polls.load(Ordering::SeqCst);
    let stats_after = harness.backend.stats_polls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(
        harness.backend.detection_polls.load(Ordering::SeqCst),
        detection_after
    );
    assert_eq!(harness.backend.stats_polls.load(Ordering::SeqCst), stats_after);
}
