//! Infrastructure layer module
//!
//! Process-level concerns around the triage pipeline:
//! - Configuration management
//! - Logging and the rejection audit trail
//! - Run report output

pub mod config;
pub mod logging;
pub mod report;

pub use report::ReportWriter;
