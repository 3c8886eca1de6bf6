//! Prior solved cases retrieved from the similarity store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::resolution::{keys, ResolutionType};

/// A previously solved case returned by similarity search. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSolution {
    /// Similarity score in `0.0..=1.0`.
    pub score: f32,
    /// Catalog metadata: component, solution text, prior resolution type,
    /// target mailbox, and anything else the catalog stored.
    pub metadata: Map<String, Value>,
    /// Summary of the prior case.
    #[serde(default)]
    pub summary: String,
}

impl CandidateSolution {
    pub fn new(score: f32, metadata: Map<String, Value>, summary: impl Into<String>) -> Self {
        Self {
            score,
            metadata,
            summary: summary.into(),
        }
    }

    /// Build a candidate from a raw store payload, splitting out `summary`.
    pub fn from_payload(score: f32, mut payload: Map<String, Value>) -> Self {
        let summary = match payload.remove("summary") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Self::new(score, payload, summary)
    }

    fn text_field(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.metadata.get(*name).and_then(Value::as_str))
    }

    pub fn solution_text(&self) -> Option<&str> {
        self.text_field(&[keys::SOLUTION_TEXT, "solution_text"])
    }

    pub fn resolution_type(&self) -> Option<ResolutionType> {
        self.text_field(&[keys::RESOLUTION_TYPE, "resolution_type"])
            .map(ResolutionType::parse)
    }
}
