//! Triage CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use triage::cli::{commands, handle_error, Cli, Commands};
use triage::infrastructure::logging::{LogConfig, LoggerImpl};
use triage::{Config, ConfigLoader};

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let mut log_config =
        LogConfig::from_settings(&config.logging).context("Invalid logging configuration")?;
    if let Some(ref level) = cli.log_level {
        log_config = log_config.with_level(level.clone());
    }
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, config, cli.json).await,
        Commands::Incidents(args) => commands::incidents::execute(args, config, cli.json).await,
        Commands::Policy(args) => commands::policy::execute(args, config, cli.json).await,
        Commands::Config => commands::config::execute(config, cli.json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}
