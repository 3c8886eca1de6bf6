//! Keyword extraction from incident text.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::llm_output::{parse_llm_output, ParsedOutput};
use super::prompts::PromptLibrary;
use crate::domain::models::{Incident, Keywords};
use crate::domain::ports::{PromptKind, TextGenerator};

pub struct KeywordExtractor {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl KeywordExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }

    /// Extract keywords. Transport and parse failures yield no keywords.
    pub async fn extract(&self, incident: &Incident) -> Keywords {
        let incident_json = incident.to_prompt_json();
        let request = self
            .prompts
            .request(PromptKind::Keywords, &[("incident", &incident_json)]);

        let raw = match self.generator.invoke(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(incident_id = %incident.id, error = %e, "Keyword extraction failed");
                return Keywords::new();
            }
        };

        match parse_llm_output::<Value>("keywords", &raw) {
            ParsedOutput::Parsed(Value::Object(map)) => {
                debug!(incident_id = %incident.id, keys = map.len(), "Extracted keywords");
                Keywords(map)
            }
            ParsedOutput::Parsed(other) => {
                warn!(incident_id = %incident.id, kind = %json_kind(&other), "Keywords were not an object");
                Keywords::new()
            }
            ParsedOutput::Empty { .. } => Keywords::new(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
