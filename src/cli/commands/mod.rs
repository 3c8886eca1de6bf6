//! CLI command implementations.

pub mod config;
pub mod incidents;
pub mod policy;
pub mod run;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::{
    HttpPolicyClient, HttpTicketingClient, OpenAiChatGenerator, OpenAiEmbeddingProvider,
    QdrantStore,
};
use crate::domain::models::Config;
use crate::domain::ports::NullAttachmentAnalyzer;
use crate::infrastructure::logging::JsonlRejectionLog;
use crate::services::Collaborators;

/// Build the HTTP-backed collaborators described by `config`.
pub fn collaborators(config: &Config) -> Result<Collaborators> {
    let ticketing = Arc::new(
        HttpTicketingClient::new(&config.ticketing).context("Failed to build ticketing client")?,
    );
    let policy =
        Arc::new(HttpPolicyClient::new(&config.policy).context("Failed to build policy client")?);
    let store = Arc::new(
        QdrantStore::new(&config.vector_store).context("Failed to build similarity store client")?,
    );
    let generator = Arc::new(
        OpenAiChatGenerator::new(config.llm.clone())
            .context("Failed to build text generation client")?,
    );
    let embedder = Arc::new(
        OpenAiEmbeddingProvider::new(config.embedding.clone())
            .context("Failed to build embedding client")?,
    );

    Ok(Collaborators {
        ticketing,
        policy,
        store,
        generator,
        embedder,
        attachments: Arc::new(NullAttachmentAnalyzer),
        rejections: Arc::new(JsonlRejectionLog::new(&config.output.rejected_dir)),
    })
}
