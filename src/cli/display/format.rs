//! Phase, time, and truncation formatters for CLI output.

use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;
use console::style;

use crate::domain::models::{Phase, StreamEventStatus};

/// Colored single-word badge for a phase.
pub fn phase_badge(phase: Phase) -> String {
    let styled = match phase {
        Phase::Detect => style("detect").cyan(),
        Phase::Decide => style("decide").yellow(),
        Phase::Execute => style("execute").magenta(),
        Phase::Prove => style("prove").blue(),
        Phase::Learn => style("learn").green(),
    };
    styled.bold().to_string()
}

/// Glyph for a stream event's progress state.
pub fn status_glyph(status: StreamEventStatus) -> &'static str {
    match status {
        StreamEventStatus::InProgress => "…",
        StreamEventStatus::Completed => "✓",
        StreamEventStatus::Warning => "!",
    }
}

/// Format a `DateTime` as relative time ("2 hours ago", "3 days ago").
pub fn relative_time(dt: &DateTime<Utc>) -> String {
    HumanTime::from(*dt - Utc::now()).to_string()
}

/// First 8 chars of an id for list display.
pub fn short_id(id: &str) -> &str {
    if id.len() >= 8 { &id[..8] } else { id }
}

/// Truncate a string with unicode ellipsis.
pub fn truncate_ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}\u{2026}")
    }
}
