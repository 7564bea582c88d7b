//! Ports: trait seams between the reconciliation core and the outside world.
//!
//! The reconciler only ever talks to the backend through [`BackendApi`], so
//! tests can drive the full loop with an in-memory fake.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ActivityItem, DetectionSnapshot, ExecutionResult, LiveStatsSnapshot, StoreReadiness,
};

/// The consumed REST surface of the dashboard backend.
///
/// All endpoints are treated as black boxes returning JSON; no byte-level
/// contract is owned here. A failed call leaves the caller's previous
/// snapshot in place (stale-but-available).
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Poll the detection-status endpoint.
    async fn detection_status(&self) -> DomainResult<DetectionSnapshot>;

    /// Poll the live-stats endpoint.
    async fn live_stats(&self) -> DomainResult<LiveStatsSnapshot>;

    /// Fetch the historical activity feed, newest last.
    async fn activity_feed(&self, limit: usize) -> DomainResult<Vec<ActivityItem>>;

    /// Fetch in-flight execution step items, oldest first.
    async fn execution_activities(&self) -> DomainResult<Vec<ActivityItem>>;

    /// Query store readiness (gates detection polling).
    async fn store_readiness(&self) -> DomainResult<StoreReadiness>;

    /// Trigger a new detection cycle. Fire-and-forget; the response only
    /// clears the local `is_detecting` flag.
    async fn trigger_detect(&self) -> DomainResult<()>;

    /// Approve an action. Ids prefixed `foundational_` are routed to the
    /// foundational-action endpoint; everything else to the generic one.
    async fn approve_action(&self, action_id: &str) -> DomainResult<ExecutionResult>;
}
