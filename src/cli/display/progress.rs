//! Spinner utilities using indicatif for the live watch view.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create the watch-view spinner: phase badge as prefix, narration as message.
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .expect("Invalid spinner template")
            .tick_chars(SPINNER_CHARS),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
