//! Critic-validated resolution loop.
//!
//! Drafts a resolution from the candidate pool and has the critic judge
//! it. Rejections feed their critique into the next attempt, up to
//! `max_retries` retries. Every way out of the loop yields a labeled draft;
//! all failure paths end in `manual` with an explanation for the operator.

use std::sync::Arc;

use tracing::{info, warn};

use super::critic::CriticValidator;
use super::metrics::MetricsRecorder;
use super::proposer::{ProposalContext, ResolutionProposer};
use crate::domain::models::{
    CandidateSolution, CriticVerdict, Incident, RejectedFilter, ResolutionConfig, ResolutionDraft,
    ResolutionType, StructuredCritique, VerdictStatus,
};
use crate::domain::ports::{RejectionRecord, RejectionSink};

const NO_CANDIDATES: &str =
    "No catalog solutions are available for this incident; review manually.";

#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub label: String,
    pub rejected_filter: RejectedFilter,
}

impl From<&ResolutionConfig> for LoopSettings {
    fn from(config: &ResolutionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            label: config.label.clone(),
            rejected_filter: config.rejected_filter,
        }
    }
}

/// The loop's decision and how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub draft: ResolutionDraft,
    /// Proposer calls made.
    pub attempts: u32,
    pub critic_calls: u32,
    /// Drafts rejected along the way.
    pub rejected: usize,
}

pub struct ResolutionLoop {
    proposer: ResolutionProposer,
    critic: CriticValidator,
    rejection_sink: Arc<dyn RejectionSink>,
    metrics: MetricsRecorder,
    settings: LoopSettings,
}

impl ResolutionLoop {
    pub fn new(
        proposer: ResolutionProposer,
        critic: CriticValidator,
        rejection_sink: Arc<dyn RejectionSink>,
        metrics: MetricsRecorder,
        settings: LoopSettings,
    ) -> Self {
        Self {
            proposer,
            critic,
            rejection_sink,
            metrics,
            settings,
        }
    }

    pub async fn resolve(&self, incident: &Incident, candidates: &[CandidateSolution]) -> LoopOutcome {
        info!(
            incident_id = %incident.id,
            candidates = candidates.len(),
            "Starting critic-validated resolution"
        );

        let mut outcome = LoopOutcome {
            draft: ResolutionDraft::default(),
            attempts: 0,
            critic_calls: 0,
            rejected: 0,
        };

        if candidates.is_empty() {
            warn!(incident_id = %incident.id, "No candidate solutions, skipping critic");
            return self.finish(outcome, ResolutionDraft::manual(NO_CANDIDATES));
        }

        let total_attempts = self.settings.max_retries.saturating_add(1);
        let mut rejected: Vec<ResolutionDraft> = Vec::new();
        let mut critique: Option<(String, StructuredCritique)> = None;

        for attempt in 1..=total_attempts {
            info!(incident_id = %incident.id, attempt, total_attempts, "Resolution attempt");

            let available = self.available(candidates, &rejected);
            if available.is_empty() {
                warn!(
                    incident_id = %incident.id,
                    rejected = rejected.len(),
                    "No candidates left after filtering rejected drafts"
                );
                let text = format!(
                    "No solutions left after filtering {} rejected drafts; review manually.",
                    rejected.len()
                );
                return self.finish(outcome, ResolutionDraft::manual(text));
            }

            let mut context = ProposalContext::new(incident);
            context.critique.clone_from(&critique);

            outcome.attempts += 1;
            let draft = match self.proposer.propose(&context, &available).await {
                Ok(Some(draft)) => draft,
                Ok(None) => {
                    warn!(incident_id = %incident.id, attempt, "Proposer returned no usable draft");
                    return self.finish(
                        outcome,
                        ResolutionDraft::manual(
                            "The resolution model returned no usable draft; review manually.",
                        ),
                    );
                }
                Err(e) => {
                    warn!(incident_id = %incident.id, attempt, error = %e, "Drafting failed");
                    let text = format!("Resolution drafting failed ({e}); review manually.");
                    return self.finish(outcome, ResolutionDraft::manual(text));
                }
            };

            outcome.critic_calls += 1;
            let mut verdict = match self.critic.evaluate(incident, &draft).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!(incident_id = %incident.id, attempt, error = %e, "Critic evaluation failed");
                    let text = format!("Critic evaluation failed ({e}); review manually.");
                    return self.finish(outcome, ResolutionDraft::manual(text));
                }
            };
            if verdict.status == VerdictStatus::Approved
                && rejected
                    .iter()
                    .any(|r| r.same_proposal(&draft, &self.settings.label))
            {
                warn!(incident_id = %incident.id, attempt, "Approved draft repeats a rejected one");
                let previous = critique.as_ref().map(|(text, _)| text.clone()).unwrap_or_default();
                verdict = CriticVerdict {
                    critique: previous,
                    ..CriticVerdict::rejected("Repeats a previously rejected proposal", "")
                };
            }
            self.metrics.record_critic_decision(verdict.status).await;
            self.metrics
                .record_problem_type(verdict.known_problem_type())
                .await;

            match verdict.status {
                VerdictStatus::Approved => {
                    info!(
                        incident_id = %incident.id,
                        attempt,
                        resolution_type = %draft.resolution_type,
                        "Resolution approved by critic"
                    );
                    return self.finish(outcome, coerce_known(draft));
                }
                VerdictStatus::AlreadyTried => {
                    warn!(incident_id = %incident.id, reason = %verdict.reason, "Resolution already tried");
                    let text = format!(
                        "The proposed solution was already tried before. {}",
                        verdict.reason
                    );
                    return self.finish(outcome, ResolutionDraft::manual(text.trim_end()));
                }
                VerdictStatus::Rejected => {
                    warn!(
                        incident_id = %incident.id,
                        attempt,
                        reason = %verdict.reason,
                        problem_type = verdict.known_problem_type().unwrap_or("unknown"),
                        recommended_approach = %verdict.recommended_approach,
                        "Resolution rejected by critic"
                    );
                    self.audit(incident, attempt, &verdict, &draft).await;
                    rejected.push(draft);
                    outcome.rejected = rejected.len();
                    critique = Some((verdict.critique.clone(), verdict.structured()));

                    if attempt == total_attempts {
                        info!(
                            incident_id = %incident.id,
                            total_rejected = rejected.len(),
                            "Maximum retries reached"
                        );
                        let text = format!(
                            "Could not produce an acceptable automatic resolution after {total_attempts} attempts. \
                             {} drafts rejected. Last critique: {}",
                            rejected.len(),
                            verdict.critique
                        );
                        return self.finish(outcome, ResolutionDraft::manual(text));
                    }
                }
            }
        }

        self.finish(
            outcome,
            ResolutionDraft::manual("The resolution process ended without a decision; review manually."),
        )
    }

    /// Candidates the proposer may still use.
    fn available<'c>(
        &self,
        candidates: &'c [CandidateSolution],
        rejected: &[ResolutionDraft],
    ) -> Vec<&'c CandidateSolution> {
        match self.settings.rejected_filter {
            // Candidates and drafts never compare equal, so nothing is removed.
            RejectedFilter::Preserve => candidates.iter().collect(),
            RejectedFilter::ByOrigin => candidates
                .iter()
                .filter(|c| !rejected.iter().any(|d| produced(c, d, &self.settings.label)))
                .collect(),
        }
    }

    async fn audit(&self, incident: &Incident, attempt: u32, verdict: &CriticVerdict, draft: &ResolutionDraft) {
        let record = RejectionRecord::new(&incident.id, attempt, verdict, draft);
        if let Err(e) = self.rejection_sink.record(&record).await {
            warn!(incident_id = %incident.id, error = %e, "Failed to record rejection");
        }
    }

    fn finish(&self, mut outcome: LoopOutcome, draft: ResolutionDraft) -> LoopOutcome {
        outcome.draft = draft.labeled(&self.settings.label);
        outcome
    }
}

/// Whether `draft` reproduces the candidate's solution.
fn produced(candidate: &CandidateSolution, draft: &ResolutionDraft, label: &str) -> bool {
    let Some(text) = candidate.solution_text() else {
        return false;
    };
    text.trim() == draft.unlabeled_text(label).trim()
        && candidate
            .resolution_type()
            .is_none_or(|t| t == draft.resolution_type)
}

/// Unrecognized types are executed as manual.
fn coerce_known(mut draft: ResolutionDraft) -> ResolutionDraft {
    if let ResolutionType::Unrecognized(raw) = &draft.resolution_type {
        warn!(resolution_type = %raw, "Unrecognized resolution type, falling back to manual");
        draft.resolution_type = ResolutionType::Manual;
    }
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockReply, RecordingRejectionSink, ScriptedTextGenerator};
    use crate::domain::ports::PromptKind;
    use crate::services::prompts::PromptLibrary;
    use serde_json::{json, Map, Value};

    const LABEL: &str = "[SPAI] ";

    struct Harness {
        generator: Arc<ScriptedTextGenerator>,
        sink: Arc<RecordingRejectionSink>,
        metrics: MetricsRecorder,
        resolution_loop: ResolutionLoop,
    }

    fn harness(generator: ScriptedTextGenerator, filter: RejectedFilter) -> Harness {
        harness_with_retries(generator, filter, 2)
    }

    fn harness_with_retries(generator: ScriptedTextGenerator, filter: RejectedFilter, max_retries: u32) -> Harness {
        let generator = Arc::new(generator);
        let prompts = Arc::new(PromptLibrary::builtin());
        let sink = Arc::new(RecordingRejectionSink::new());
        let metrics = MetricsRecorder::new();
        let resolution_loop = ResolutionLoop::new(
            ResolutionProposer::new(generator.clone(), prompts.clone()),
            CriticValidator::new(generator.clone(), prompts),
            sink.clone(),
            metrics.clone(),
            LoopSettings {
                max_retries,
                label: LABEL.to_string(),
                rejected_filter: filter,
            },
        );
        Harness {
            generator,
            sink,
            metrics,
            resolution_loop,
        }
    }

    fn candidate(solution: &str, resolution_type: &str) -> CandidateSolution {
        let Value::Object(metadata) = json!({"SOLUCIÓN": solution, "RESOLUCION AUTOMÁTICA": resolution_type})
        else {
            unreachable!()
        };
        CandidateSolution::new(0.9, metadata, "prior case")
    }

    fn incident() -> Incident {
        Incident::new("INC-1", "Provision", "Policy stuck in provision")
    }

    #[tokio::test]
    async fn test_empty_pool_skips_critic() {
        let h = harness(ScriptedTextGenerator::new(), RejectedFilter::Preserve);
        let outcome = h.resolution_loop.resolve(&incident(), &[]).await;

        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
        assert_eq!(outcome.critic_calls, 0);
        assert_eq!(h.generator.calls(PromptKind::Critique), 0);
        assert_eq!(h.generator.calls(PromptKind::Propose), 0);
        assert!(outcome.draft.solution_text.starts_with(LABEL));
    }

    #[tokio::test]
    async fn test_approved_on_first_attempt() {
        let generator = ScriptedTextGenerator::new()
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "close", "SOLUCIÓN": "Dates fixed"}"#)
            .reply_text(PromptKind::Critique, r#"{"status": "APPROVED", "problem_type": "dates"}"#);
        let h = harness(generator, RejectedFilter::Preserve);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("Dates fixed", "close")])
            .await;

        assert_eq!(outcome.draft.resolution_type, ResolutionType::Close);
        assert_eq!(outcome.draft.solution_text, "[SPAI] Dates fixed");
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.critic_calls, 1);
        let metrics = h.metrics.snapshot().await;
        assert_eq!(metrics.critic_approvals, 1);
        assert_eq!(metrics.problem_types["dates"], 1);
    }

    #[tokio::test]
    async fn test_rejections_exhaust_retries() {
        let generator = ScriptedTextGenerator::new()
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "close", "SOLUCIÓN": "one"}"#)
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "wait", "SOLUCIÓN": "two"}"#)
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "manual", "SOLUCIÓN": "three"}"#)
            .default_text(
                PromptKind::Critique,
                r#"{"status": "REJECTED", "reason": "no", "critique": "still wrong"}"#,
            );
        let h = harness(generator, RejectedFilter::Preserve);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("x", "close")])
            .await;

        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.critic_calls, 3);
        assert_eq!(outcome.rejected, 3);
        assert!(outcome.draft.solution_text.contains("3 drafts rejected"));
        assert!(outcome.draft.solution_text.contains("Last critique: still wrong"));
        assert_eq!(h.sink.records().len(), 3);
        assert_eq!(h.sink.records()[1].attempt, 2);
    }

    #[tokio::test]
    async fn test_critique_carried_into_next_attempt() {
        let generator = ScriptedTextGenerator::new()
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "close", "SOLUCIÓN": "one"}"#)
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "reassign", "BUZON REASIGNACION": "GR_B", "SOLUCIÓN": "two"}"#)
            .reply_text(
                PromptKind::Critique,
                r#"{"status": "REJECTED", "critique": "wrong team", "avoid_solution_types": ["close"]}"#,
            )
            .reply_text(PromptKind::Critique, r#"{"status": "APPROVED"}"#);
        let h = harness(generator, RejectedFilter::Preserve);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("x", "close")])
            .await;

        assert_eq!(outcome.draft.resolution_type, ResolutionType::Reassign);
        assert_eq!(outcome.draft.target_mailbox, "GR_B");
        let requests = h.generator.requests(PromptKind::Propose);
        assert!(!requests[0].user.contains("wrong team"));
        assert!(requests[1].user.contains("wrong team"));
    }

    #[tokio::test]
    async fn test_already_tried_is_terminal() {
        let generator = ScriptedTextGenerator::new()
            .default_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "close", "SOLUCIÓN": "one"}"#)
            .reply_text(PromptKind::Critique, r#"{"status": "ALREADY_TRIED", "reason": "closed last week"}"#);
        let h = harness(generator, RejectedFilter::Preserve);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("x", "close")])
            .await;

        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
        assert!(outcome.draft.solution_text.contains("closed last week"));
        assert_eq!(outcome.critic_calls, 1);
        assert_eq!(h.generator.calls(PromptKind::Propose), 1);
    }

    #[tokio::test]
    async fn test_repeated_rejected_draft_never_returned() {
        let generator = ScriptedTextGenerator::new()
            .default_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "close", "SOLUCIÓN": "same"}"#)
            .reply_text(PromptKind::Critique, r#"{"status": "REJECTED", "critique": "bad"}"#)
            .default_text(PromptKind::Critique, r#"{"status": "APPROVED"}"#);
        let h = harness(generator, RejectedFilter::Preserve);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("x", "close")])
            .await;

        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
        assert_eq!(outcome.critic_calls, 3);
        assert_eq!(outcome.rejected, 3);

        let summary = h.metrics.summary().await;
        assert_eq!(summary.critic.approvals, 0);
        assert_eq!(summary.critic.rejections, 3);
    }

    #[tokio::test]
    async fn test_max_retries_at_upper_bound_does_not_overflow() {
        let generator = ScriptedTextGenerator::new()
            .default_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "close", "SOLUCIÓN": "Dates fixed"}"#)
            .default_text(PromptKind::Critique, r#"{"status": "REJECTED", "critique": "no"}"#);
        let h = harness_with_retries(generator, RejectedFilter::ByOrigin, u32::MAX);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("Dates fixed", "close")])
            .await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
    }

    #[tokio::test]
    async fn test_by_origin_filter_empties_pool() {
        let generator = ScriptedTextGenerator::new()
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "close", "SOLUCIÓN": "Dates fixed"}"#)
            .reply_text(PromptKind::Critique, r#"{"status": "REJECTED", "critique": "no"}"#);
        let h = harness(generator, RejectedFilter::ByOrigin);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("Dates fixed", "close")])
            .await;

        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
        assert!(outcome.draft.solution_text.contains("filtering 1 rejected drafts"));
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_unusable_proposal_falls_back_to_manual() {
        let generator = ScriptedTextGenerator::new().reply(PromptKind::Propose, MockReply::text("no idea"));
        let h = harness(generator, RejectedFilter::Preserve);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("x", "close")])
            .await;
        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
        assert_eq!(outcome.critic_calls, 0);
    }

    #[tokio::test]
    async fn test_unrecognized_type_coerced_on_approval() {
        let generator = ScriptedTextGenerator::new()
            .reply_text(PromptKind::Propose, r#"{"RESOLUCION AUTOMÁTICA": "escalate", "SOLUCIÓN": "s"}"#)
            .reply_text(PromptKind::Critique, r#"{"status": "APPROVED"}"#);
        let h = harness(generator, RejectedFilter::Preserve);

        let outcome = h
            .resolution_loop
            .resolve(&incident(), &[candidate("x", "close")])
            .await;
        assert_eq!(outcome.draft.resolution_type, ResolutionType::Manual);
        assert_eq!(outcome.draft.solution_text, "[SPAI] s");
    }

    #[test]
    fn test_produced_matches_text_and_type() {
        let c = candidate("Dates fixed", "close");
        assert!(produced(&c, &ResolutionDraft::new(ResolutionType::Close, "", "[SPAI] Dates fixed"), LABEL));
        assert!(!produced(&c, &ResolutionDraft::new(ResolutionType::Wait, "", "Dates fixed"), LABEL));
        let bare = CandidateSolution::new(0.1, Map::new(), "");
        assert!(!produced(&bare, &ResolutionDraft::manual(""), LABEL));
    }
}
