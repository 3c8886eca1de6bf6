//! Progress indicators for long-running commands, using indicatif.
//!
//! Bars draw to stderr and are hidden in JSON mode so stdout stays
//! parseable.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const PROGRESS_TEMPLATE: &str =
    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg} (ETA: {eta})";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";

const PROGRESS_CHARS: &str = "█▓▒░ ";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Progress bar over the incidents of a run
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS);
    pb.set_style(style);
    pb
}

/// Spinner for calls whose duration is unknown (listing incidents)
pub fn create_spinner_with_message(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS);
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// A bar that never draws.
pub fn hidden() -> ProgressBar {
    ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
}

/// Extension trait for ProgressBar to add common utility methods
pub trait ProgressBarExt {
    /// Finish with a success message (green checkmark)
    fn finish_success(&self, message: impl Into<String>);

    /// Finish with a warning message (yellow !)
    fn finish_warning(&self, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("{} {}", console::style("✓").green(), message.into()));
    }

    fn finish_warning(&self, message: impl Into<String>) {
        self.finish_with_message(format!("{} {}", console::style("!").yellow(), message.into()));
    }
}
