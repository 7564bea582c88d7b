//! Wire models for the dashboard backend.
//!
//! The backend speaks camelCase JSON; these DTOs own that casing and the
//! nesting quirks, and convert into the snake_case domain snapshots. No
//! byte-level contract is owned here: unknown fields are ignored, missing
//! optional fields default.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::{
    ActivityItem, DetectionPhase, DetectionSnapshot, DetectionStatus, EventMetric,
    ExecutionPhase, ExecutionResult, ExecutionStatus, FieldChange, FoundationalAction,
    LiveStatsSnapshot, Phase, ProductOptimization, StoreReadiness, StreamEvent,
    StreamEventStatus,
};

/// GET detection-status response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStatusDto {
    #[serde(default)]
    pub phase: DetectionPhase,
    #[serde(default)]
    pub status: DetectionStatus,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub committed_action_id: Option<String>,
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    #[serde(default)]
    pub execution_phase: ExecutionPhase,
}

impl From<DetectionStatusDto> for DetectionSnapshot {
    fn from(dto: DetectionStatusDto) -> Self {
        Self {
            phase: dto.phase,
            status: dto.status,
            complete: dto.complete,
            committed_action_id: dto.committed_action_id,
            execution_status: dto.execution_status,
            execution_phase: dto.execution_phase,
        }
    }
}

/// Nested detection mirror inside the live-stats payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionMirrorDto {
    #[serde(default)]
    pub phase: DetectionPhase,
    #[serde(default)]
    pub complete: bool,
}

/// Foundational action as served by live-stats.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundationalActionDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<FoundationalActionDto> for FoundationalAction {
    fn from(dto: FoundationalActionDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            description: dto.description,
        }
    }
}

/// GET live-stats response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatsDto {
    #[serde(default)]
    pub detection: DetectionMirrorDto,
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    #[serde(default)]
    pub execution_phase: ExecutionPhase,
    #[serde(default)]
    pub committed_action_id: Option<String>,
    #[serde(default)]
    pub foundational_action: Option<FoundationalActionDto>,
}

impl From<LiveStatsDto> for LiveStatsSnapshot {
    fn from(dto: LiveStatsDto) -> Self {
        Self {
            detection_phase: dto.detection.phase,
            detection_complete: dto.detection.complete,
            execution_status: dto.execution_status,
            execution_phase: dto.execution_phase,
            committed_action_id: dto.committed_action_id,
            foundational_action: dto.foundational_action.map(Into::into),
        }
    }
}

/// GET store-readiness response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReadinessDto {
    #[serde(default)]
    pub status: StoreReadiness,
}

impl From<StoreReadinessDto> for StoreReadiness {
    fn from(dto: StoreReadinessDto) -> Self {
        dto.status
    }
}

/// One metric attached to a stream or activity event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetricDto {
    pub label: String,
    pub value: String,
}

impl From<EventMetricDto> for EventMetric {
    fn from(dto: EventMetricDto) -> Self {
        Self {
            label: dto.label,
            value: dto.value,
        }
    }
}

/// One push event on the SSE stream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEventDto {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub phase: Phase,
    #[serde(default)]
    pub status: StreamEventStatus,
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub metrics: Vec<EventMetricDto>,
}

impl From<StreamEventDto> for StreamEvent {
    fn from(dto: StreamEventDto) -> Self {
        Self {
            id: dto.id,
            timestamp: dto.timestamp,
            event_type: dto.event_type,
            phase: dto.phase,
            status: dto.status,
            message: dto.message,
            detail: dto.detail,
            metrics: dto.metrics.into_iter().map(Into::into).collect(),
        }
    }
}

/// One entry of the activity-feed / execution-activities responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItemDto {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    pub message: String,
}

impl From<ActivityItemDto> for ActivityItem {
    fn from(dto: ActivityItemDto) -> Self {
        Self {
            id: dto.id,
            timestamp: dto.timestamp,
            phase: dto.phase,
            message: dto.message,
        }
    }
}

/// POST approve-action response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResultDto {
    pub success: bool,
    #[serde(default)]
    pub action_label: String,
    #[serde(default)]
    pub products_optimized: Vec<ProductOptimizationDto>,
    #[serde(default)]
    pub total_changes: u32,
    #[serde(default)]
    pub estimated_impact: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

/// One optimized product in an execution result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOptimizationDto {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub changes: Vec<FieldChangeDto>,
    #[serde(default)]
    pub impact_explanation: Option<String>,
}

/// One field-level change in an execution result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChangeDto {
    pub field: String,
    #[serde(default)]
    pub before: String,
    #[serde(default)]
    pub after: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<ExecutionResultDto> for ExecutionResult {
    fn from(dto: ExecutionResultDto) -> Self {
        Self {
            success: dto.success,
            action_label: dto.action_label,
            products_optimized: dto
                .products_optimized
                .into_iter()
                .map(|p| ProductOptimization {
                    product_id: p.product_id,
                    product_name: p.product_name,
                    changes: p
                        .changes
                        .into_iter()
                        .map(|c| FieldChange {
                            field: c.field,
                            before: c.before,
                            after: c.after,
                            reason: c.reason,
                        })
                        .collect(),
                    impact_explanation: p.impact_explanation,
                })
                .collect(),
            total_changes: dto.total_changes,
            estimated_impact: dto.estimated_impact,
            execution_time_ms: dto.execution_time_ms,
        }
    }
}
