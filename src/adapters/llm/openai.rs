//! OpenAI-compatible chat completion adapter.
//!
//! Sends the rendered system/user pair to `{base_url}/chat/completions`
//! and returns the first choice's content. Works with hosted OpenAI and
//! with Ollama's `/v1` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::http::{build_client, endpoint, send_json};
use crate::domain::errors::{DomainError, DomainResult, ExternalSystem};
use crate::domain::models::LlmConfig;
use crate::domain::ports::{GenerationRequest, TextGenerator};

const SYSTEM: ExternalSystem = ExternalSystem::TextGeneration;

pub struct OpenAiChatGenerator {
    config: LlmConfig,
    client: Client,
}

impl OpenAiChatGenerator {
    pub fn new(config: LlmConfig) -> DomainResult<Self> {
        let client = build_client(SYSTEM, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> Option<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatGenerator {
    fn name(&self) -> &'static str {
        "openai-chat"
    }

    async fn invoke(&self, request: &GenerationRequest) -> DomainResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let mut http_request = self
            .client
            .post(endpoint(&self.config.base_url, "/chat/completions"))
            .json(&body);
        if let Some(api_key) = self.api_key() {
            http_request = http_request.bearer_auth(api_key);
        }

        let response: ChatResponse = send_json(SYSTEM, http_request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::SerializationError("chat response had no content".to_string()))?;

        debug!(
            prompt = request.kind.name(),
            model = %self.config.model,
            response_len = content.len(),
            "Text generated"
        );
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PromptKind;
    use mockito::Matcher;
    use serde_json::json;

    fn generator(url: &str) -> OpenAiChatGenerator {
        OpenAiChatGenerator::new(LlmConfig {
            base_url: url.to_string(),
            model: "gemma3".to_string(),
            api_key: Some("sk-local".to_string()),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            kind: PromptKind::Relevance,
            system: "judge".to_string(),
            user: "is it?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invoke_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-local")
            .match_body(Matcher::PartialJson(json!({
                "model": "gemma3",
                "messages": [
                    {"role": "system", "content": "judge"},
                    {"role": "user", "content": "is it?"}
                ]
            })))
            .with_status(200)
            .with_body(
                json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": "true"}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let text = generator(&server.url()).invoke(&request()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(text, "true");
    }

    #[tokio::test]
    async fn test_no_choices_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let err = generator(&server.url()).invoke(&request()).await.unwrap_err();
        assert!(matches!(err, DomainError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_rate_limited_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let err = generator(&server.url()).invoke(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::UnexpectedStatus { system: ExternalSystem::TextGeneration, status: 429, .. }
        ));
    }
}
