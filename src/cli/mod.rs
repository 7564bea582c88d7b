//! CLI layer: argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

pub mod commands;
pub mod display;
pub mod output;

pub use output::{output, CommandOutput};

/// Zyra: revenue loop reconciler.
#[derive(Parser, Debug)]
#[command(name = "zyra", version, about = "Revenue loop reconciler for the Zyra optimization cycle")]
pub struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .zyra/config.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reconciler and render live loop progress
    Watch,
    /// One-shot status of the optimization loop
    Status,
    /// Trigger a new detection cycle
    Detect,
    /// Approve an action by id
    Approve(commands::approve::ApproveArgs),
    /// Show recent loop activity
    Activity(commands::activity::ActivityArgs),
}

/// Print an error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({ "error": err.to_string() });
        eprintln!("{payload}");
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(1);
}
