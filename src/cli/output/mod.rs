//! Output formatting utilities for the CLI.

pub mod progress;
pub mod table;

use serde::Serialize;

pub use progress::{create_progress_bar, create_spinner_with_message, ProgressBarExt};

/// A command result that renders for humans or as JSON.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
