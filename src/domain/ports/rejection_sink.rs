//! Audit port for critic rejections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{CriticVerdict, ResolutionDraft};

/// One rejected draft, as written to the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub timestamp: DateTime<Utc>,
    pub incident_id: String,
    pub attempt: u32,
    pub reason: String,
    pub critique: String,
    pub problem_type: Option<String>,
    pub avoid_solution_types: Vec<String>,
    pub recommended_approach: String,
    pub draft: ResolutionDraft,
}

impl RejectionRecord {
    pub fn new(incident_id: &str, attempt: u32, verdict: &CriticVerdict, draft: &ResolutionDraft) -> Self {
        Self {
            timestamp: Utc::now(),
            incident_id: incident_id.to_string(),
            attempt,
            reason: verdict.reason.clone(),
            critique: verdict.critique.clone(),
            problem_type: verdict.problem_type.clone(),
            avoid_solution_types: verdict.avoid_solution_types.clone(),
            recommended_approach: verdict.recommended_approach.clone(),
            draft: draft.clone(),
        }
    }
}

#[async_trait]
pub trait RejectionSink: Send + Sync {
    async fn record(&self, record: &RejectionRecord) -> DomainResult<()>;
}

/// Sink that drops every record.
#[derive(Debug, Clone, Default)]
pub struct NullRejectionSink;

#[async_trait]
impl RejectionSink for NullRejectionSink {
    async fn record(&self, _record: &RejectionRecord) -> DomainResult<()> {
        Ok(())
    }
}
