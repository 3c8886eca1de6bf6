//! Adapters implementing the domain ports.
//!
//! - `ticketing`, `policy`: REST clients for the back-office systems
//! - `qdrant`: similarity store over the Qdrant REST API
//! - `llm`, `embeddings`: OpenAI-compatible model endpoints
//! - `mock`: scripted in-memory doubles

pub mod embeddings;
pub mod http;
pub mod llm;
pub mod mock;
pub mod policy;
pub mod qdrant;
pub mod ticketing;

pub use embeddings::OpenAiEmbeddingProvider;
pub use llm::OpenAiChatGenerator;
pub use policy::HttpPolicyClient;
pub use qdrant::QdrantStore;
pub use ticketing::HttpTicketingClient;
