//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty console output
//! - Rolling JSON log files
//! - Rejection audit trail

pub mod audit;
pub mod config;
pub mod logger;

pub use audit::JsonlRejectionLog;
pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
