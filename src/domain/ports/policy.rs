//! Policy system port.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::ResolutionDraft;

/// Input of the policy-check routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyCheckRequest {
    #[serde(rename = "poliza")]
    pub policy_number: String,
    #[serde(rename = "codSolucion")]
    pub solution_code: String,
    /// Serialized keyword context.
    #[serde(rename = "strJson")]
    pub context: String,
}

/// Policy system operations.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Fetch a policy record by number.
    async fn get_policy(&self, policy_number: &str) -> DomainResult<serde_json::Value>;

    /// Run the policy-check routine. The answer is a new draft to dispatch.
    async fn check_policy(&self, request: &PolicyCheckRequest) -> DomainResult<ResolutionDraft>;
}
