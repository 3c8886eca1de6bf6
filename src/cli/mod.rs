//! Command-line surface of the triage binary.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::incidents::IncidentsArgs;
use commands::policy::PolicyArgs;
use commands::run::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "triage")]
#[command(about = "Critic-validated triage of insurance support incidents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .triage/config.yaml + .triage/local.yaml)
    #[arg(short, long, global = true, env = "TRIAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Triage every open incident of a mailbox and write the run report
    Run(RunArgs),

    /// List open incidents
    Incidents(IncidentsArgs),

    /// Fetch a policy from the policy system
    Policy(PolicyArgs),

    /// Print the effective configuration
    Config,
}

/// Print a command error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": chain.get(1..).unwrap_or_default(),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err}", console::style("Error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    std::process::exit(1);
}
