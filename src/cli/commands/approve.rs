//! `zyra approve` - approve a committed or foundational action.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::adapters::BackendClient;
use crate::cli::display::format::truncate_ellipsis;
use crate::cli::display::table::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ExecutionResult};
use crate::domain::ports::BackendApi;

#[derive(Args, Debug)]
pub struct ApproveArgs {
    /// Action id to approve (`foundational_`-prefixed ids route to the
    /// foundational endpoint)
    pub action_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApproveOutput {
    pub action_label: String,
    pub products_optimized: usize,
    pub total_changes: u32,
    pub estimated_impact: Option<String>,
    pub execution_time_ms: u64,
    pub validated: bool,
    #[serde(skip)]
    result: ExecutionResult,
}

impl CommandOutput for ApproveOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["product", "field", "after", "reason"]);
        let mut rows = 0;
        for product in &self.result.products_optimized {
            for change in &product.changes {
                table.add_row(vec![
                    truncate_ellipsis(&product.product_name, 24),
                    change.field.clone(),
                    truncate_ellipsis(&change.after, 48),
                    change.reason.clone().unwrap_or_else(|| "-".to_string()),
                ]);
                rows += 1;
            }
        }

        let mut lines = vec![format!(
            "Executed: {} ({} ms)",
            self.action_label, self.execution_time_ms
        )];
        if let Some(ref impact) = self.estimated_impact {
            lines.push(format!("Estimated impact: {impact}"));
        }
        if !self.validated {
            lines.push(
                "Warning: result carries no validated content; the loop stays in prove."
                    .to_string(),
            );
        }
        lines.push(render_list("change", &table, rows));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ApproveArgs, config: &Config, json: bool) -> Result<()> {
    let client = BackendClient::new(&config.backend)?;
    let result = client.approve_action(&args.action_id).await?;

    let summary = ApproveOutput {
        action_label: result.action_label.clone(),
        products_optimized: result.products_optimized.len(),
        total_changes: result.total_changes,
        estimated_impact: result.estimated_impact.clone(),
        execution_time_ms: result.execution_time_ms,
        validated: result.has_validated_content(),
        result,
    };

    output(&summary, json);
    Ok(())
}
