//! `zyra activity` - recent loop activity.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::BackendClient;
use crate::cli::display::format::{relative_time, truncate_ellipsis};
use crate::cli::display::table::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ActivityItem, Config};
use crate::domain::ports::BackendApi;

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Maximum number of entries to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct ActivityOutput {
    pub items: Vec<ActivityItem>,
}

impl CommandOutput for ActivityOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["when", "phase", "message"]);
        for item in self.items.iter().rev() {
            table.add_row(vec![
                relative_time(&item.timestamp),
                item.phase.to_string(),
                truncate_ellipsis(&item.message, 64),
            ]);
        }
        render_list("entry", &table, self.items.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ActivityArgs, config: &Config, json: bool) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;
    let items = client
        .activity_feed(args.limit)
        .await
        .context("fetching activity feed")?;

    output(&ActivityOutput { items }, json);
    Ok(())
}
