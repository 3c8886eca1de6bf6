//! Text-generation port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// What a generation call is for. Each kind has its own prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    ExpandQuery,
    Relevance,
    Propose,
    Critique,
    Keywords,
}

impl PromptKind {
    pub const ALL: [Self; 5] = [
        Self::ExpandQuery,
        Self::Relevance,
        Self::Propose,
        Self::Critique,
        Self::Keywords,
    ];

    /// Template file stem.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExpandQuery => "rephrase_incidence",
            Self::Relevance => "check_relevance",
            Self::Propose => "generate_resolution",
            Self::Critique => "critic_resolution",
            Self::Keywords => "extract_keywords",
        }
    }
}

/// A rendered prompt ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
}

/// Model endpoint returning raw text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(&self, request: &GenerationRequest) -> DomainResult<String>;
}
