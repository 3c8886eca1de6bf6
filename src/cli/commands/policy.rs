//! `triage policy <number>`: fetch one policy record.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::HttpPolicyClient;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::PolicyClient;

#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Policy number, e.g. 666023054-53-1
    pub number: String,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PolicyOutput(pub serde_json::Value);

impl CommandOutput for PolicyOutput {
    fn to_human(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }
}

pub async fn execute(args: PolicyArgs, config: Config, json: bool) -> Result<()> {
    let client = HttpPolicyClient::new(&config.policy)?;
    let policy = client
        .get_policy(&args.number)
        .await
        .with_context(|| format!("Failed to fetch policy {}", args.number))?;

    output(&PolicyOutput(policy), json);
    Ok(())
}
