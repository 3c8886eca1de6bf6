//! Domain errors for the triage pipeline.

use thiserror::Error;

/// External systems the pipeline talks to. Used to tag transport failures
/// and to key per-system API status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalSystem {
    Ticketing,
    Policy,
    SimilarityStore,
    TextGeneration,
    Embedding,
    AttachmentAnalysis,
}

impl ExternalSystem {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ticketing => "ticketing",
            Self::Policy => "policy",
            Self::SimilarityStore => "similarity_store",
            Self::TextGeneration => "text_generation",
            Self::Embedding => "embedding",
            Self::AttachmentAnalysis => "attachment_analysis",
        }
    }
}

impl std::fmt::Display for ExternalSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level errors that can occur while triaging incidents.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{system} request failed: {message}")]
    Transport {
        system: ExternalSystem,
        message: String,
    },

    #[error("{system} returned {status}: {body}")]
    UnexpectedStatus {
        system: ExternalSystem,
        status: u16,
        body: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl DomainError {
    pub fn transport(system: ExternalSystem, message: impl Into<String>) -> Self {
        Self::Transport {
            system,
            message: message.into(),
        }
    }

    /// The external system this error originated from, if any.
    pub const fn system(&self) -> Option<ExternalSystem> {
        match self {
            Self::Transport { system, .. } | Self::UnexpectedStatus { system, .. } => {
                Some(*system)
            }
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
