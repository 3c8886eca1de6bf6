//! Resolution drafting from an incident and its candidate pool.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use super::llm_output::{parse_llm_output, ParsedOutput};
use super::prompts::PromptLibrary;
use crate::domain::errors::DomainResult;
use crate::domain::models::{CandidateSolution, DraftPayload, Incident, ResolutionDraft, StructuredCritique};
use crate::domain::ports::{PromptKind, TextGenerator};

/// The incident plus critique carried over from earlier attempts.
#[derive(Debug, Clone)]
pub struct ProposalContext<'a> {
    pub incident: &'a Incident,
    pub critique: Option<(String, StructuredCritique)>,
}

impl<'a> ProposalContext<'a> {
    pub const fn new(incident: &'a Incident) -> Self {
        Self {
            incident,
            critique: None,
        }
    }

    /// Incident JSON with `critique_context` and `structured_critique`
    /// attached when a prior critique exists.
    pub fn to_prompt_value(&self) -> Value {
        let mut value = serde_json::to_value(self.incident).unwrap_or(Value::Null);
        if let (Some((text, structured)), Value::Object(map)) = (&self.critique, &mut value) {
            map.insert("critique_context".to_string(), Value::String(text.clone()));
            map.insert(
                "structured_critique".to_string(),
                serde_json::to_value(structured).unwrap_or(Value::Null),
            );
        }
        value
    }

    fn critique_text(&self) -> String {
        match &self.critique {
            None => "none".to_string(),
            Some((text, structured)) => {
                let mut lines = vec![format!("Last critique: {text}")];
                if !structured.avoid_solution_types.is_empty() {
                    lines.push(format!(
                        "Avoid solution types: {}",
                        structured.avoid_solution_types.join(", ")
                    ));
                }
                if !structured.recommended_approach.is_empty() {
                    lines.push(format!("Recommended approach: {}", structured.recommended_approach));
                }
                lines.join("\n")
            }
        }
    }
}

pub struct ResolutionProposer {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl ResolutionProposer {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }

    /// Draft a resolution. `Ok(None)` when the reply holds no usable draft.
    pub async fn propose(
        &self,
        context: &ProposalContext<'_>,
        candidates: &[&CandidateSolution],
    ) -> DomainResult<Option<ResolutionDraft>> {
        let incident_json = context.to_prompt_value().to_string();
        let candidates_json = Value::Array(
            candidates
                .iter()
                .map(|c| json!({"score": c.score, "summary": c.summary, "metadata": c.metadata}))
                .collect(),
        )
        .to_string();
        let critique = context.critique_text();

        let request = self.prompts.request(
            PromptKind::Propose,
            &[
                ("incident", &incident_json),
                ("candidates", &candidates_json),
                ("critique", &critique),
            ],
        );
        let raw = self.generator.invoke(&request).await?;

        let draft = match parse_llm_output::<DraftPayload>("resolution", &raw) {
            ParsedOutput::Parsed(payload) => payload.into_first(),
            ParsedOutput::Empty { .. } => None,
        };
        if let Some(draft) = &draft {
            debug!(
                incident_id = %context.incident.id,
                resolution_type = %draft.resolution_type,
                "Drafted resolution"
            );
        }
        Ok(draft)
    }
}
