//! `zyra status` - one-shot snapshot of the loop.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::adapters::BackendClient;
use crate::cli::display::format::phase_badge;
use crate::cli::display::table::list_table;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::BackendApi;
use crate::services::resolver::{self, CycleState, LocalState, ResolveInputs};

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub phase: String,
    pub rule: &'static str,
    pub detection_complete: bool,
    pub detection_phase: String,
    pub detection_status: String,
    pub execution_status: String,
    pub committed_action_id: Option<String>,
    pub foundational_action: Option<String>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["field", "value"]);
        table.add_row(vec!["phase".to_string(), self.phase.clone()]);
        table.add_row(vec![
            "cycle complete".to_string(),
            self.detection_complete.to_string(),
        ]);
        table.add_row(vec!["detection phase".to_string(), self.detection_phase.clone()]);
        table.add_row(vec![
            "detection status".to_string(),
            self.detection_status.clone(),
        ]);
        table.add_row(vec![
            "execution status".to_string(),
            self.execution_status.clone(),
        ]);
        if let Some(ref id) = self.committed_action_id {
            table.add_row(vec!["committed action".to_string(), id.clone()]);
        }
        if let Some(ref action) = self.foundational_action {
            table.add_row(vec!["foundational action".to_string(), action.clone()]);
        }
        format!("Loop status:\n{table}")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;

    let detection = client
        .detection_status()
        .await
        .context("fetching detection status")?;
    let stats = client.live_stats().await.ok();

    // One-shot resolve over the fetched snapshots; no local or cycle state.
    let local = LocalState::default();
    let cycle = CycleState::default();
    let inputs = ResolveInputs {
        detection: Some(&detection),
        stats: stats.as_ref(),
        stream_events: &[],
        stream_connected: false,
        local: &local,
        cycle: &cycle,
    };
    let resolution = resolver::resolve(&inputs);
    let derived = resolver::derived_execution_status(&inputs);

    let result = StatusOutput {
        phase: if json {
            resolution.phase.as_str().to_string()
        } else {
            phase_badge(resolution.phase)
        },
        rule: resolution.rule,
        detection_complete: resolution.is_complete,
        detection_phase: format!("{:?}", detection.phase),
        detection_status: format!("{:?}", detection.status),
        execution_status: derived.to_string(),
        committed_action_id: detection.committed_action_id.clone(),
        foundational_action: stats
            .and_then(|s| s.foundational_action)
            .map(|a| format!("{} ({})", a.title, a.id)),
    };

    output(&result, json);
    Ok(())
}
