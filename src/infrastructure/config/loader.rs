use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} URL cannot be empty")]
    EmptyUrl(&'static str),

    #[error("Ticketing mailbox cannot be empty")]
    EmptyMailbox,

    #[error("Invalid top_k: {0}. Must be at least 1")]
    InvalidTopK(usize),

    #[error("Invalid max_chain_depth: {0}. Must be at least 1")]
    InvalidChainDepth(u32),

    #[error("Invalid critic_approval_threshold: {0}. Must be between 0 and 100")]
    InvalidApprovalThreshold(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .triage/config.yaml (project config)
    /// 3. .triage/local.yaml (local overrides, optional)
    /// 4. Environment variables (TRIAGE_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".triage/config.yaml"))
            .merge(Yaml::file(".triage/local.yaml"))
            .merge(Env::prefixed("TRIAGE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring `TRIAGE_*`
    /// overrides.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TRIAGE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let urls = [
            ("Ticketing", &config.ticketing.base_url),
            ("Policy", &config.policy.base_url),
            ("Vector store", &config.vector_store.url),
            ("LLM", &config.llm.base_url),
            ("Embedding", &config.embedding.base_url),
        ];
        if let Some((name, _)) = urls.iter().find(|(_, url)| url.trim().is_empty()) {
            return Err(ConfigError::EmptyUrl(name));
        }

        if config.ticketing.mailbox.trim().is_empty() {
            return Err(ConfigError::EmptyMailbox);
        }

        if config.vector_store.top_k == 0 {
            return Err(ConfigError::InvalidTopK(0));
        }

        if config.vector_store.collection.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "vector_store.collection cannot be empty".to_string(),
            ));
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::ValidationFailed(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }

        if config.resolution.max_chain_depth == 0 {
            return Err(ConfigError::InvalidChainDepth(0));
        }

        let threshold = config.metrics.critic_approval_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::InvalidApprovalThreshold(threshold));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
