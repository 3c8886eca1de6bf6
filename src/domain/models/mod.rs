pub mod candidate;
pub mod config;
pub mod execution;
pub mod incident;
pub mod resolution;
pub mod verdict;

pub use candidate::CandidateSolution;
pub use config::{
    Config, EmbeddingConfig, LlmConfig, LoggingConfig, MetricsConfig, OutputConfig, PolicyConfig,
    RejectedFilter, ResolutionConfig, TicketingConfig, VectorStoreConfig,
};
pub use execution::{ApiCallStatus, ApiStatus, ExecutionResult, Keywords};
pub use incident::{HistoryEntry, Incident};
pub use resolution::{DraftPayload, ResolutionDraft, ResolutionType};
pub use verdict::{CriticVerdict, StructuredCritique, VerdictStatus};
