//! Table output formatting for CLI commands
//!
//! Incident listings, run results and run metrics rendered with comfy-table.

use crate::cli::output::truncate;
use crate::domain::models::{ApiCallStatus, Incident, ResolutionType};
use crate::services::{IncidentFailure, MetricsSummary, ReportEntry};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Open incidents of a mailbox
    pub fn format_incidents(&self, incidents: &[Incident]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Title", "Mailbox", "History"]));

        for incident in incidents {
            table.add_row(vec![
                Cell::new(&incident.id),
                Cell::new(truncate(&incident.title, 50)),
                Cell::new(&incident.mailbox),
                Cell::new(incident.history.len()),
            ]);
        }

        table.to_string()
    }

    /// One row per processed incident of a run
    pub fn format_results(&self, entries: &[ReportEntry]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Incident", "Resolution", "Ticketing", "Policy", "Solution"]));

        for entry in entries {
            let result = &entry.resolution;
            let resolution = Cell::new(result.reported_type());
            let resolution = if self.use_colors {
                resolution.fg(resolution_color(result.final_type()))
            } else {
                resolution
            };
            table.add_row(vec![
                Cell::new(&entry.incident.id),
                resolution,
                self.status_cell(&result.api_status.ticketing),
                self.status_cell(&result.api_status.policy),
                Cell::new(truncate(&result.draft.solution_text, 60)),
            ]);
        }

        table.to_string()
    }

    pub fn format_failures(&self, failures: &[IncidentFailure]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Incident", "Error"]));

        for failure in failures {
            let error = Cell::new(truncate(&failure.error, 80));
            table.add_row(vec![
                Cell::new(&failure.incident_id),
                if self.use_colors { error.fg(Color::Red) } else { error },
            ]);
        }

        table.to_string()
    }

    /// Key figures of the run metrics
    pub fn format_summary(&self, summary: &MetricsSummary) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Metric", "Value"]));

        let rows = [
            ("Incidents", summary.total_incidents.to_string()),
            ("Total time", format!("{:.2}s", summary.total_time_secs)),
            ("Avg time / incident", format!("{:.2}s", summary.avg_time_per_incident_secs)),
            ("Critic evaluations", summary.critic.total_evaluations.to_string()),
            ("Critic approval rate", format!("{:.1}%", summary.critic.approval_rate)),
            ("Avg candidates", format!("{:.2}", summary.avg_candidates_per_incident)),
            (
                "With / without candidates",
                format!(
                    "{} / {}",
                    summary.incidents_with_candidates, summary.incidents_without_candidates
                ),
            ),
            ("Processing errors", summary.processing_errors.to_string()),
        ];
        for (metric, value) in rows {
            table.add_row(vec![Cell::new(metric), Cell::new(value)]);
        }
        for (resolution, count) in &summary.resolution_distribution {
            table.add_row(vec![Cell::new(format!("  {resolution}")), Cell::new(count)]);
        }
        for (system, count) in &summary.api_errors {
            table.add_row(vec![Cell::new(format!("API errors: {system}")), Cell::new(count)]);
        }

        table.to_string()
    }

    fn status_cell(&self, status: &ApiCallStatus) -> Cell {
        let cell = Cell::new(match status {
            ApiCallStatus::NotCalled => "-".to_string(),
            ApiCallStatus::Ok => "OK".to_string(),
            ApiCallStatus::Error(message) => truncate(message, 30),
        });
        if !self.use_colors {
            return cell;
        }
        match status {
            ApiCallStatus::NotCalled => cell.fg(Color::DarkGrey),
            ApiCallStatus::Ok => cell.fg(Color::Green),
            ApiCallStatus::Error(_) => cell.fg(Color::Red),
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

fn resolution_color(resolution_type: &ResolutionType) -> Color {
    match resolution_type {
        ResolutionType::Close => Color::Green,
        ResolutionType::Wait => Color::Yellow,
        ResolutionType::Reassign => Color::Cyan,
        ResolutionType::Api(_) => Color::Blue,
        ResolutionType::Manual | ResolutionType::Unrecognized(_) => Color::Magenta,
    }
}
