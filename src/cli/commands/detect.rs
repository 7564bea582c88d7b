//! `zyra detect` - trigger a new detection cycle.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::adapters::BackendClient;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::BackendApi;

#[derive(Debug, Serialize)]
pub struct DetectOutput {
    pub triggered: bool,
}

impl CommandOutput for DetectOutput {
    fn to_human(&self) -> String {
        "Detection cycle triggered. Run `zyra watch` to follow progress.".to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;
    client
        .trigger_detect()
        .await
        .context("triggering detection")?;

    output(&DetectOutput { triggered: true }, json);
    Ok(())
}
