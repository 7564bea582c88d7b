//! Command output plumbing: human or JSON, selected by the global flag.

use serde_json::Value;

/// Dual-format output for CLI commands.
pub trait CommandOutput {
    /// Render for a human terminal.
    fn to_human(&self) -> String;
    /// Render as a JSON value.
    fn to_json(&self) -> Value;
}

/// Print a command result in the requested format.
pub fn output(result: &impl CommandOutput, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("{}", result.to_human());
    }
}
