//! Execution of approved resolutions.
//!
//! Terminal types map to one ticketing action each. `api|<code>` drafts go
//! to the policy system, whose answer is itself a draft and is dispatched
//! again. The chain ends on a terminal type or, past `max_chain_depth`
//! policy calls, on a `manual` result.
//!
//! ```text
//! manual ─────────────────────────────► (no call)
//! close / wait / reassign ────────────► ticketing action
//! api|code ─► no policy number ───────► wait (ask operator) ─► ticketing
//!           └► policy check ─► error ─► manual
//!                           └► draft ─► dispatch again
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::models::{
    ApiCallStatus, ApiStatus, ExecutionResult, Incident, Keywords, ResolutionConfig, ResolutionDraft,
    ResolutionType,
};
use crate::domain::ports::{IncidentAction, PolicyCheckRequest, PolicyClient, TicketingClient};

const MISSING_POLICY_NUMBER: &str = "The policy number is needed to continue. \
     Please add it to the incident so the request can be checked.";

type DispatchFuture<'a> = Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub label: String,
    /// Maximum policy checks in one chain.
    pub max_chain_depth: u32,
}

impl From<&ResolutionConfig> for DispatchSettings {
    fn from(config: &ResolutionConfig) -> Self {
        Self {
            label: config.label.clone(),
            max_chain_depth: config.max_chain_depth,
        }
    }
}

pub struct ActionDispatcher {
    ticketing: Arc<dyn TicketingClient>,
    policy: Arc<dyn PolicyClient>,
    settings: DispatchSettings,
}

impl ActionDispatcher {
    pub fn new(
        ticketing: Arc<dyn TicketingClient>,
        policy: Arc<dyn PolicyClient>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            ticketing,
            policy,
            settings,
        }
    }

    /// Execute `draft` for `incident`. The result always carries a
    /// terminal resolution type.
    pub async fn dispatch(
        &self,
        draft: Option<ResolutionDraft>,
        incident: &Incident,
        keywords: &Keywords,
    ) -> ExecutionResult {
        let Some(draft) = draft else {
            warn!(incident_id = %incident.id, "No draft to dispatch");
            return ExecutionResult::new(
                ResolutionDraft::manual("No resolution was produced; review manually.")
                    .labeled(&self.settings.label),
                ApiStatus::default(),
                keywords.clone(),
            );
        };
        let mut draft = draft;
        // Only the chain itself may record where it started.
        draft.original_resolution_type = None;
        let result = self.dispatch_at(draft, incident, keywords, 0).await;
        debug_assert!(result.final_type().is_terminal());
        result
    }

    fn dispatch_at<'a>(
        &'a self,
        draft: ResolutionDraft,
        incident: &'a Incident,
        keywords: &'a Keywords,
        depth: u32,
    ) -> DispatchFuture<'a> {
        Box::pin(async move {
            let draft = draft.labeled(&self.settings.label);
            debug!(
                incident_id = %incident.id,
                resolution_type = %draft.resolution_type,
                depth,
                "Dispatching resolution"
            );

            match draft.resolution_type.clone() {
                ResolutionType::Manual => self.finish(draft, ApiStatus::default(), keywords),
                ResolutionType::Unrecognized(raw) => {
                    warn!(incident_id = %incident.id, resolution_type = %raw, "Unrecognized resolution type, leaving for manual review");
                    let mut draft = draft;
                    draft.resolution_type = ResolutionType::Manual;
                    self.finish(draft, ApiStatus::default(), keywords)
                }
                ResolutionType::Close => {
                    let action = IncidentAction::Resolve {
                        notes: draft.solution_text.clone(),
                    };
                    self.ticketing_action(draft, incident, keywords, action).await
                }
                ResolutionType::Wait => {
                    let action = IncidentAction::Hold {
                        detail: draft.solution_text.clone(),
                    };
                    self.ticketing_action(draft, incident, keywords, action).await
                }
                ResolutionType::Reassign => {
                    let action = IncidentAction::Reassign {
                        mailbox: draft.target_mailbox.clone(),
                        detail: draft.solution_text.clone(),
                    };
                    self.ticketing_action(draft, incident, keywords, action).await
                }
                ResolutionType::Api(code) => self.policy_chain(draft, code, incident, keywords, depth).await,
            }
        })
    }

    async fn ticketing_action(
        &self,
        draft: ResolutionDraft,
        incident: &Incident,
        keywords: &Keywords,
        action: IncidentAction,
    ) -> ExecutionResult {
        let status = match self.ticketing.apply_action(&incident.id, &action).await {
            Ok(()) => {
                info!(incident_id = %incident.id, action = action.name(), "Ticketing action applied");
                ApiCallStatus::Ok
            }
            Err(e) => {
                error!(incident_id = %incident.id, action = action.name(), error = %e, "Ticketing action failed");
                ApiCallStatus::error(e.to_string())
            }
        };
        self.finish(draft, ApiStatus::ticketing(status), keywords)
    }

    async fn policy_chain(
        &self,
        mut draft: ResolutionDraft,
        code: String,
        incident: &Incident,
        keywords: &Keywords,
        depth: u32,
    ) -> ExecutionResult {
        let origin = draft
            .original_resolution_type
            .get_or_insert_with(|| draft.resolution_type.clone())
            .clone();

        if depth >= self.settings.max_chain_depth {
            warn!(
                incident_id = %incident.id,
                depth,
                max_chain_depth = self.settings.max_chain_depth,
                "Policy chain did not converge"
            );
            let mut manual = ResolutionDraft::manual(format!(
                "The policy system did not reach a final decision after {depth} checks; review manually."
            ));
            manual.original_resolution_type = Some(origin);
            return self.finish(manual.labeled(&self.settings.label), ApiStatus::default(), keywords);
        }

        let Some(policy_number) = keywords.policy_number() else {
            info!(incident_id = %incident.id, code = %code, "No policy number found, asking operator");
            let mut wait = ResolutionDraft::new(ResolutionType::Wait, "", MISSING_POLICY_NUMBER);
            wait.original_resolution_type = Some(origin);
            return self.dispatch_at(wait, incident, keywords, depth).await;
        };

        let request = PolicyCheckRequest {
            policy_number,
            solution_code: code.clone(),
            context: keywords.to_context_json(),
        };
        let original_text = draft.unlabeled_text(&self.settings.label).to_string();

        match self.policy.check_policy(&request).await {
            Err(e) => {
                error!(incident_id = %incident.id, code = %code, error = %e, "Policy check failed");
                let mut manual = ResolutionDraft::manual(format!(
                    "{original_text} | Policy check failed: {e}"
                ));
                manual.original_resolution_type = Some(origin);
                self.finish(
                    manual.labeled(&self.settings.label),
                    ApiStatus::policy(ApiCallStatus::error(e.to_string())),
                    keywords,
                )
            }
            Ok(mut next) => {
                info!(
                    incident_id = %incident.id,
                    code = %code,
                    next_type = %next.resolution_type,
                    "Policy check answered"
                );
                let returned = next.unlabeled_text(&self.settings.label).to_string();
                next.solution_text = format!("{original_text} | Sistema: {returned}");
                next.original_resolution_type = Some(origin);

                let mut result = self.dispatch_at(next, incident, keywords, depth + 1).await;
                if !result.api_status.policy.is_called() {
                    result.api_status.policy = ApiCallStatus::Ok;
                }
                result
            }
        }
    }

    fn finish(&self, draft: ResolutionDraft, api_status: ApiStatus, keywords: &Keywords) -> ExecutionResult {
        ExecutionResult::new(draft, api_status, keywords.clone())
    }
}
