//! Common test utilities for integration tests.
//!
//! Provides an in-memory fake backend and fixture builders shared across
//! integration test files.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use zyra::domain::errors::{DomainError, DomainResult};
use zyra::domain::models::{
    ActivityItem, DetectionSnapshot, ExecutionResult, FieldChange, LiveStatsSnapshot, Phase,
    ProductOptimization, StoreReadiness, StreamEvent, StreamEventStatus,
};
use zyra::domain::ports::BackendApi;

/// In-memory backend whose responses tests mutate on the fly.
pub struct FakeBackend {
    pub detection: Mutex<DetectionSnapshot>,
    pub stats: Mutex<LiveStatsSnapshot>,
    pub readiness: Mutex<StoreReadiness>,
    pub activities: Mutex<Vec<ActivityItem>>,
    pub approve_response: Mutex<Option<Result<ExecutionResult, String>>>,
    pub detection_polls: AtomicUsize,
    pub stats_polls: AtomicUsize,
    pub detect_triggers: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            detection: Mutex::new(DetectionSnapshot::default()),
            stats: Mutex::new(LiveStatsSnapshot::default()),
            readiness: Mutex::new(StoreReadiness::Ready),
            activities: Mutex::new(Vec::new()),
            approve_response: Mutex::new(None),
            detection_polls: AtomicUsize::new(0),
            stats_polls: AtomicUsize::new(0),
            detect_triggers: AtomicUsize::new(0),
        }
    }
}

impl FakeBackend {
    pub fn set_detection(&self, snapshot: DetectionSnapshot) {
        *self.detection.lock().unwrap() = snapshot;
    }

    pub fn set_stats(&self, snapshot: LiveStatsSnapshot) {
        *self.stats.lock().unwrap() = snapshot;
    }

    pub fn set_approve_ok(&self, result: ExecutionResult) {
        *self.approve_response.lock().unwrap() = Some(Ok(result));
    }

    pub fn set_approve_err(&self, reason: &str) {
        *self.approve_response.lock().unwrap() = Some(Err(reason.to_string()));
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn detection_status(&self) -> DomainResult<DetectionSnapshot> {
        self.detection_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detection.lock().unwrap().clone())
    }

    async fn live_stats(&self) -> DomainResult<LiveStatsSnapshot> {
        self.stats_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stats.lock().unwrap().clone())
    }

    async fn activity_feed(&self, limit: usize) -> DomainResult<Vec<ActivityItem>> {
        let activities = self.activities.lock().unwrap();
        Ok(activities.iter().rev().take(limit).rev().cloned().collect())
    }

    async fn execution_activities(&self) -> DomainResult<Vec<ActivityItem>> {
        Ok(Vec::new())
    }

    async fn store_readiness(&self) -> DomainResult<StoreReadiness> {
        Ok(*self.readiness.lock().unwrap())
    }

    async fn trigger_detect(&self) -> DomainResult<()> {
        self.detect_triggers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn approve_action(&self, action_id: &str) -> DomainResult<ExecutionResult> {
        match self.approve_response.lock().unwrap().clone() {
            Some(Ok(result)) => Ok(result),
            Some(Err(reason)) => Err(DomainError::ApprovalRejected {
                action_id: action_id.to_string(),
                reason,
            }),
            None => Ok(validated_result("default")),
        }
    }
}

/// An execution result that passes content validation.
pub fn validated_result(label: &str) -> ExecutionResult {
    ExecutionResult {
        success: true,
        action_label: label.to_string(),
        products_optimized: vec![ProductOptimization {
            product_id: "p-1".to_string(),
            product_name: "Linen Shirt".to_string(),
            changes: vec![FieldChange {
                field: "title".to_string(),
                before: "shirt".to_string(),
                after: "Relaxed Linen Shirt".to_string(),
                reason: Some("thin title".to_string()),
            }],
            impact_explanation: Some("stronger titles convert better".to_string()),
        }],
        total_changes: 1,
        estimated_impact: Some("+1.8% conversion".to_string()),
        execution_time_ms: 4_200,
    }
}

/// An execution result whose only change has an empty after-value.
pub fn unvalidated_result(label: &str) -> ExecutionResult {
    let mut result = validated_result(label);
    result.products_optimized[0].changes[0].after = String::new();
    result
}

/// A stream event with the given type and explicit phase field.
pub fn stream_event(id: &str, event_type: &str, phase: Phase) -> StreamEvent {
    StreamEvent {
        id: id.to_string(),
        timestamp: Utc::now(),
        event_type: event_type.to_string(),
        phase,
        status: StreamEventStatus::InProgress,
        message: format!("{event_type} in progress"),
        detail: None,
        metrics: Vec::new(),
    }
}
