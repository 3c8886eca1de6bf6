use super::config::{LogConfig, LogFormat, RotationPolicy};
use anyhow::{Context, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_FILE_PREFIX: &str = "triage.log";

/// Logger implementation using tracing
///
/// Console output goes to stderr so command output on stdout stays
/// machine-readable.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Initialize the global subscriber with the given configuration
    ///
    /// The returned value holds the file writer guard; drop it only at exit.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        layers.push(match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_filter(env_filter(default_level))
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_span_events(FmtSpan::NONE)
                .with_filter(env_filter(default_level))
                .boxed(),
        });

        let guard = match config.log_dir {
            Some(ref log_dir) => {
                let file_appender = match config.rotation {
                    RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_PREFIX),
                    RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_PREFIX),
                    RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_PREFIX),
                };
                let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

                // File output is always JSON
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking_file)
                        .with_ansi(false)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_filter(env_filter(default_level))
                        .boxed(),
                );
                Some(guard)
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .context("failed to install tracing subscriber")?;

        tracing::debug!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

/// `RUST_LOG` directives on top of the configured default level
fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
