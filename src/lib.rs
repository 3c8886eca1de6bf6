//! Triage - critic-validated incident triage
//!
//! Reads open support incidents from a ticketing system, retrieves similar
//! solved cases, drafts a resolution with a text-generation model, has a
//! critic pass validate it, and executes the accepted decision against the
//! ticketing and policy systems.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): the triage pipeline components
//! - **Adapters** (`adapters`): HTTP implementations of the ports and test doubles
//! - **Infrastructure Layer** (`infrastructure`): config, logging, audit and reports
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use triage::{ConfigLoader, PromptLibrary, TriagePipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let parts = triage::cli::commands::collaborators(&config)?;
//!     let pipeline = TriagePipeline::assemble(&config, Arc::new(PromptLibrary::builtin()), parts);
//!     let outcome = pipeline.run(&config.ticketing.mailbox, None).await?;
//!     println!("{} incidents triaged", outcome.entries.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CandidateSolution, Config, CriticVerdict, ExecutionResult, Incident, Keywords,
    ResolutionDraft, ResolutionType, VerdictStatus,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ActionDispatcher, PromptLibrary, ResolutionLoop, RunOutcome, TriagePipeline,
};
