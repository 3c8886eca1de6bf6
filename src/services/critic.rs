//! Critic validation of drafted resolutions.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use super::llm_output::{parse_llm_output, ParsedOutput};
use super::prompts::PromptLibrary;
use crate::domain::errors::DomainResult;
use crate::domain::models::{CriticVerdict, Incident, ResolutionDraft};
use crate::domain::ports::{PromptKind, TextGenerator};

pub struct CriticValidator {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl CriticValidator {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }

    /// Judge `draft` against `incident`.
    ///
    /// A reply that cannot be parsed counts as approval, the same as a
    /// verdict without a status.
    pub async fn evaluate(&self, incident: &Incident, draft: &ResolutionDraft) -> DomainResult<CriticVerdict> {
        let incident_json = incident.to_prompt_json();
        let draft_json = json!({ "metadata": draft }).to_string();
        let request = self.prompts.request(
            PromptKind::Critique,
            &[("incident", &incident_json), ("draft", &draft_json)],
        );
        let raw = self.generator.invoke(&request).await?;

        let verdict = match parse_llm_output::<CriticVerdict>("critic", &raw) {
            ParsedOutput::Parsed(verdict) => verdict,
            ParsedOutput::Empty { .. } => {
                warn!(incident_id = %incident.id, "Critic reply unparseable, treating as approved");
                CriticVerdict::default()
            }
        };
        debug!(
            incident_id = %incident.id,
            status = verdict.status.as_str(),
            problem_type = verdict.problem_type.as_deref().unwrap_or(""),
            "Critic verdict"
        );
        Ok(verdict)
    }
}
