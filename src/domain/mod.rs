//! Domain layer for the triage pipeline
//!
//! This module contains the incident/resolution models, the domain error
//! type and the port traits implemented by adapters.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, ExternalSystem};
