//! Port trait definitions (Hexagonal Architecture)
//!
//! Async interfaces for every collaborator the pipeline depends on:
//! - TicketingClient: list incidents and apply resolve/hold/reassign actions
//! - PolicyClient: policy lookup and the policy-check routine
//! - SimilarityStore: nearest-neighbour search over prior cases
//! - TextGenerator: prompt-in, raw-text-out model calls
//! - EmbeddingProvider: text to vector
//! - AttachmentAnalyzer: attachment to text
//! - RejectionSink: audit trail of critic rejections

pub mod attachment;
pub mod embedding;
pub mod policy;
pub mod rejection_sink;
pub mod similarity_store;
pub mod text_generation;
pub mod ticketing;

pub use attachment::{AttachmentAnalyzer, NullAttachmentAnalyzer};
pub use embedding::EmbeddingProvider;
pub use policy::{PolicyCheckRequest, PolicyClient};
pub use rejection_sink::{NullRejectionSink, RejectionRecord, RejectionSink};
pub use similarity_store::{SearchHit, SimilarityStore};
pub use text_generation::{GenerationRequest, PromptKind, TextGenerator};
pub use ticketing::{IncidentAction, TicketingClient};
