//! Query expansion: alternative phrasings of an incident for retrieval.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::llm_output::{parse_llm_output, ParsedOutput};
use super::prompts::PromptLibrary;
use crate::domain::errors::DomainResult;
use crate::domain::models::Incident;
use crate::domain::ports::{PromptKind, TextGenerator};

pub struct QueryExpander {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl QueryExpander {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }

    /// Phrasings to search with. The incident description always comes
    /// first, so a reply that cannot be parsed still yields one phrasing.
    ///
    /// Only a failed generation call is an error.
    pub async fn expand(&self, incident: &Incident) -> DomainResult<Vec<String>> {
        let incident_json = incident.to_prompt_json();
        let request = self
            .prompts
            .request(PromptKind::ExpandQuery, &[("incident", &incident_json)]);
        let raw = self.generator.invoke(&request).await?;

        let generated = match parse_llm_output::<Value>("rephrase", &raw) {
            ParsedOutput::Parsed(value) => phrasings_from(value),
            ParsedOutput::Empty { .. } => Vec::new(),
        };
        if generated.is_empty() {
            warn!(incident_id = %incident.id, "No alternative phrasings generated");
        }

        let mut phrasings = Vec::with_capacity(generated.len() + 1);
        phrasings.push(incident.description.clone());
        phrasings.extend(generated);
        debug!(incident_id = %incident.id, count = phrasings.len(), "Expanded query");
        Ok(phrasings)
    }
}

/// Accepts `["a", "b"]`, `[{"query": "a"}]` or `{"<any>": ["a", "b"]}`.
fn phrasings_from(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(phrasing_text).collect(),
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items.into_iter().filter_map(phrasing_text).collect()),
                _ => None,
            })
            .unwrap_or_default(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

fn phrasing_text(item: Value) -> Option<String> {
    let text = match item {
        Value::String(s) => s,
        Value::Object(mut map) => ["query", "phrasing", "text"]
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(Value::String(s)) => Some(s),
                _ => None,
            })?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockReply, ScriptedTextGenerator};
    use serde_json::json;

    fn expander(reply: MockReply) -> QueryExpander {
        let generator = ScriptedTextGenerator::new().reply(PromptKind::ExpandQuery, reply);
        QueryExpander::new(Arc::new(generator), Arc::new(PromptLibrary::builtin()))
    }

    fn incident() -> Incident {
        Incident::new("INC-1", "Provision", "Policy stuck in provision")
    }

    #[tokio::test]
    async fn test_description_comes_first() {
        let phrasings = expander(MockReply::text("[\"policy pending\", \"provision delay\"]"))
            .expand(&incident())
            .await
            .unwrap();
        assert_eq!(
            phrasings,
            vec!["Policy stuck in provision", "policy pending", "provision delay"]
        );
    }

    #[tokio::test]
    async fn test_unparseable_reply_keeps_description() {
        let phrasings = expander(MockReply::text("Sorry, I can't"))
            .expand(&incident())
            .await
            .unwrap();
        assert_eq!(phrasings, vec!["Policy stuck in provision"]);
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        assert!(expander(MockReply::failure("down")).expand(&incident()).await.is_err());
    }

    #[test]
    fn test_phrasing_shapes() {
        assert_eq!(phrasings_from(json!({"queries": ["a", " ", "b"]})), vec!["a", "b"]);
        assert_eq!(phrasings_from(json!([{"query": "a"}, 3, "b"])), vec!["a", "b"]);
        assert!(phrasings_from(json!(42)).is_empty());
    }
}
