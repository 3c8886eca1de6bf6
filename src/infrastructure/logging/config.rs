use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::domain::models::LoggingConfig;

/// Resolved logger settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Console output format
    pub format: LogFormat,

    /// Directory for rolling log files (console only when `None`)
    pub log_dir: Option<PathBuf>,

    /// File rotation policy, only used with `log_dir`
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => bail!("Invalid log format: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl LogConfig {
    /// Build logger settings from the loaded configuration section.
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self> {
        Ok(Self {
            level: settings.level.clone(),
            format: LogFormat::parse(&settings.format)?,
            log_dir: settings.log_dir.clone(),
            rotation: RotationPolicy::default(),
        })
    }

    /// Same settings with the level replaced, e.g. from `--verbose`.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}
