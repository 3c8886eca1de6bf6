//! OpenAI-compatible embedding provider adapter.
//!
//! Calls the `/embeddings` endpoint of any OpenAI-compatible API
//! (hosted OpenAI, Azure OpenAI, Ollama's `/v1`, local servers).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::adapters::http::{build_client, endpoint, send_json};
use crate::domain::errors::{DomainError, DomainResult, ExternalSystem};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;

const SYSTEM: ExternalSystem = ExternalSystem::Embedding;

/// OpenAI-compatible embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: EmbeddingConfig,
    client: Client,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> DomainResult<Self> {
        let client = build_client(SYSTEM, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Configured key, then `OPENAI_API_KEY`. Local endpoints need none.
    fn api_key(&self) -> Option<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    async fn call_embeddings_api(&self, texts: Vec<String>) -> DomainResult<Vec<Vec<f32>>> {
        let request_body = EmbeddingsRequest {
            model: self.config.model.clone(),
            input: texts,
        };

        let mut request = self
            .client
            .post(endpoint(&self.config.base_url, "/embeddings"))
            .json(&request_body);
        if let Some(api_key) = self.api_key() {
            request = request.bearer_auth(api_key);
        }

        let result: EmbeddingsResponse = send_json(SYSTEM, request).await?;

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let vector = self
            .call_embeddings_api(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::SerializationError("Empty embedding response".to_string()))?;

        if vector.len() != self.config.dimension {
            tracing::warn!(
                expected = self.config.dimension,
                actual = vector.len(),
                model = %self.config.model,
                "Embedding dimension differs from configuration"
            );
        }
        Ok(vector)
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
