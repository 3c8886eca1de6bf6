//! `triage run`: triage every open incident of a mailbox.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::table::TableFormatter;
use crate::cli::output::{create_progress_bar, output, progress, CommandOutput, ProgressBarExt};
use crate::domain::models::Config;
use crate::infrastructure::ReportWriter;
use crate::services::{PromptLibrary, RunOutcome, TriagePipeline};

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Mailbox to triage (defaults to ticketing.mailbox)
    #[arg(short, long)]
    pub mailbox: Option<String>,

    /// Retries after a critic rejection (defaults to resolution.max_retries)
    #[arg(long)]
    pub max_retries: Option<u32>,
}

impl RunArgs {
    /// Configuration with the command-line overrides applied.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(ref mailbox) = self.mailbox {
            config.ticketing.mailbox.clone_from(mailbox);
        }
        if let Some(max_retries) = self.max_retries {
            config.resolution.max_retries = max_retries;
        }
        config
    }
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    #[serde(flatten)]
    pub outcome: RunOutcome,
    pub report_path: PathBuf,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let outcome = &self.outcome;
        let mut lines = vec![format!(
            "Run {} on {}: {} processed, {} failed",
            outcome.run_id,
            outcome.mailbox,
            outcome.entries.len(),
            outcome.failures.len()
        )];

        if outcome.entries.is_empty() {
            lines.push("No incidents were processed.".to_string());
        } else {
            lines.push(formatter.format_results(&outcome.entries));
        }
        if !outcome.failures.is_empty() {
            lines.push(format!("\n{}", console::style("Failed incidents").red().bold()));
            lines.push(formatter.format_failures(&outcome.failures));
        }
        lines.push(format!("\n{}", console::style("Metrics").bold()));
        lines.push(formatter.format_summary(&outcome.summary));
        lines.push(format!("\nReport written to {}", self.report_path.display()));
        lines.join("\n")
    }
}

pub async fn execute(args: RunArgs, config: Config, json: bool) -> Result<()> {
    let config = args.apply(config);
    let prompts = Arc::new(
        PromptLibrary::load(config.prompts_dir.as_deref())
            .context("Failed to load prompt templates")?,
    );
    let parts = super::collaborators(&config)?;
    let pipeline = TriagePipeline::assemble(&config, prompts, parts);

    let bar = if json {
        progress::hidden()
    } else {
        create_progress_bar(0)
    };
    let on_progress = |done: usize, total: usize| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    };

    let outcome = pipeline
        .run(&config.ticketing.mailbox, Some(&on_progress))
        .await
        .with_context(|| format!("Triage run on mailbox {} failed", config.ticketing.mailbox))?;

    if outcome.failures.is_empty() {
        bar.finish_success(format!("{} incidents triaged", outcome.entries.len()));
    } else {
        bar.finish_warning(format!(
            "{} incidents triaged, {} failed",
            outcome.entries.len(),
            outcome.failures.len()
        ));
    }

    outcome
        .summary
        .log(config.metrics.critic_approval_threshold);

    let report_path = ReportWriter::new(&config.output.report_dir)
        .write(&outcome.entries)
        .await?;

    output(
        &RunOutput {
            outcome,
            report_path,
        },
        json,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_to_config() {
        let args = RunArgs {
            mailbox: Some("GR_OTHER".to_string()),
            max_retries: Some(0),
        };
        let config = args.apply(Config::default());
        assert_eq!(config.ticketing.mailbox, "GR_OTHER");
        assert_eq!(config.resolution.max_retries, 0);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let config = RunArgs::default().apply(Config::default());
        assert_eq!(config.ticketing.mailbox, Config::default().ticketing.mailbox);
        assert_eq!(config.resolution.max_retries, 2);
    }
}
