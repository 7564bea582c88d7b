//! Stream event model.
//!
//! Push events arrive on one logical SSE stream in non-decreasing timestamp
//! order. The resolver treats the last element of the received sequence as
//! authoritative for the current phase; there is no reordering or correction
//! of earlier events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Progress state carried by a stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventStatus {
    InProgress,
    Completed,
    Warning,
}

impl Default for StreamEventStatus {
    fn default() -> Self {
        Self::InProgress
    }
}

/// Labeled metric attached to a stream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetric {
    pub label: String,
    pub value: String,
}

/// One push event from the backend's activity stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Unique event id.
    pub id: String,
    /// Server-side emission time.
    pub timestamp: DateTime<Utc>,
    /// Phase-prefixed type, e.g. `DETECT_SCAN_STARTED`, `EXECUTE_APPLY`.
    pub event_type: String,
    /// Explicit phase field, consulted when the type prefix is unknown.
    pub phase: Phase,
    /// Progress state.
    #[serde(default)]
    pub status: StreamEventStatus,
    /// Human-readable line for the activity feed.
    pub message: String,
    /// Optional expanded detail.
    #[serde(default)]
    pub detail: Option<String>,
    /// Optional metrics to render alongside the message.
    #[serde(default)]
    pub metrics: Vec<EventMetric>,
}

impl StreamEvent {
    /// The phase this event describes: type prefix first, explicit field
    /// as fallback.
    pub fn resolved_phase(&self) -> Phase {
        Phase::from_event_type(&self.event_type).unwrap_or(self.phase)
    }
}

/// A historical activity feed entry (REST-served, not streamed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    pub message: String,
}
