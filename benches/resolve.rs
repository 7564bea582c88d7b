//! Microbenchmarks for the phase resolver rule table.
//!
//! The resolver runs on every tick of the reconciler loop, so it should
//! stay comfortably sub-microsecond.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use zyra::domain::models::{
    DetectionPhase, DetectionSnapshot, DetectionStatus, ExecutionPhase, ExecutionStatus,
    LiveStatsSnapshot, Phase, StreamEvent, StreamEventStatus,
};
use zyra::services::resolver::{resolve, CycleState, LocalState, ResolveInputs};

fn stream_events(n: usize) -> Vec<StreamEvent> {
    (0..n)
        .map(|i| StreamEvent {
            id: format!("evt-{i}"),
            timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
            event_type: "EXECUTE_APPLY".to_string(),
            phase: Phase::Execute,
            status: StreamEventStatus::InProgress,
            message: "applying".to_string(),
            detail: None,
            metrics: Vec::new(),
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let detection = DetectionSnapshot {
        phase: DetectionPhase::DecisionReady,
        status: DetectionStatus::FrictionFound,
        complete: true,
        committed_action_id: Some("opp-42".to_string()),
        execution_status: ExecutionStatus::AwaitingApproval,
        execution_phase: ExecutionPhase::Idle,
    };
    let stats = LiveStatsSnapshot {
        detection_phase: DetectionPhase::DecisionReady,
        detection_complete: true,
        ..Default::default()
    };
    let local = LocalState::default();
    let cycle = CycleState::default();

    c.bench_function("resolve/polled_only", |b| {
        let inputs = ResolveInputs {
            detection: Some(&detection),
            stats: Some(&stats),
            stream_events: &[],
            stream_connected: false,
            local: &local,
            cycle: &cycle,
        };
        b.iter(|| black_box(resolve(black_box(&inputs))));
    });

    let events = stream_events(512);
    c.bench_function("resolve/stream_tail_512_events", |b| {
        let inputs = ResolveInputs {
            detection: Some(&detection),
            stats: Some(&stats),
            stream_events: &events,
            stream_connected: true,
            local: &local,
            cycle: &cycle,
        };
        b.iter(|| black_box(resolve(black_box(&inputs))));
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
