//! `triage incidents`: list open incidents without processing them.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::HttpTicketingClient;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{create_spinner_with_message, output, CommandOutput};
use crate::domain::models::{Config, Incident};
use crate::domain::ports::TicketingClient;

#[derive(Args, Debug, Clone, Default)]
pub struct IncidentsArgs {
    /// Mailbox to list (defaults to ticketing.mailbox)
    #[arg(short, long)]
    pub mailbox: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IncidentListOutput {
    pub mailbox: String,
    pub incidents: Vec<Incident>,
    pub total: usize,
}

impl CommandOutput for IncidentListOutput {
    fn to_human(&self) -> String {
        if self.incidents.is_empty() {
            return format!("No open incidents in {}.", self.mailbox);
        }
        format!(
            "{} open incident(s) in {}:\n{}",
            self.total,
            self.mailbox,
            TableFormatter::new().format_incidents(&self.incidents)
        )
    }
}

pub async fn execute(args: IncidentsArgs, config: Config, json: bool) -> Result<()> {
    let mailbox = args
        .mailbox
        .unwrap_or_else(|| config.ticketing.mailbox.clone());
    let client = HttpTicketingClient::new(&config.ticketing)?;

    let spinner = (!json).then(|| create_spinner_with_message(format!("Listing {mailbox}...")));
    let incidents = client
        .list_open(Some(&mailbox))
        .await
        .with_context(|| format!("Failed to list open incidents of {mailbox}"));
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let incidents = incidents?;

    output(
        &IncidentListOutput {
            mailbox,
            total: incidents.len(),
            incidents,
        },
        json,
    );
    Ok(())
}
