//! Batch triage of the open incidents of one mailbox.
//!
//! Incidents are processed one at a time, in listing order:
//! annotate → expand → retrieve + filter → resolution loop → keywords →
//! dispatch. A failure inside one incident is logged and recorded, and the
//! run moves on; only failing to list incidents aborts the run.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::action_dispatcher::ActionDispatcher;
use super::attachments::AttachmentAnnotator;
use super::keywords::KeywordExtractor;
use super::metrics::{MetricsRecorder, MetricsSummary};
use super::query_expander::QueryExpander;
use super::resolution_loop::ResolutionLoop;
use super::critic::CriticValidator;
use super::prompts::PromptLibrary;
use super::proposer::ResolutionProposer;
use super::retrieval::{CandidateCollector, RelevanceFilter, SimilarityRetriever};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, ExecutionResult, Incident};
use crate::domain::ports::{
    AttachmentAnalyzer, EmbeddingProvider, PolicyClient, RejectionSink, SimilarityStore,
    TextGenerator, TicketingClient,
};

/// One processed incident, as written to the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub incident: Incident,
    pub resolution: ExecutionResult,
}

/// An incident whose processing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentFailure {
    pub incident_id: String,
    pub error: String,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub mailbox: String,
    pub entries: Vec<ReportEntry>,
    pub failures: Vec<IncidentFailure>,
    pub summary: MetricsSummary,
}

/// External collaborators a pipeline is assembled from.
#[derive(Clone)]
pub struct Collaborators {
    pub ticketing: Arc<dyn TicketingClient>,
    pub policy: Arc<dyn PolicyClient>,
    pub store: Arc<dyn SimilarityStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub attachments: Arc<dyn AttachmentAnalyzer>,
    pub rejections: Arc<dyn RejectionSink>,
}

/// Progress notification: incidents done so far and the total.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

pub struct TriagePipeline {
    ticketing: Arc<dyn TicketingClient>,
    annotator: AttachmentAnnotator,
    expander: QueryExpander,
    collector: CandidateCollector,
    resolution_loop: ResolutionLoop,
    keywords: KeywordExtractor,
    dispatcher: ActionDispatcher,
    metrics: MetricsRecorder,
}

impl TriagePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticketing: Arc<dyn TicketingClient>,
        annotator: AttachmentAnnotator,
        expander: QueryExpander,
        collector: CandidateCollector,
        resolution_loop: ResolutionLoop,
        keywords: KeywordExtractor,
        dispatcher: ActionDispatcher,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            ticketing,
            annotator,
            expander,
            collector,
            resolution_loop,
            keywords,
            dispatcher,
            metrics,
        }
    }

    /// Wire every component from configuration and collaborators.
    pub fn assemble(config: &Config, prompts: Arc<PromptLibrary>, parts: Collaborators) -> Self {
        let metrics = MetricsRecorder::new();
        let generator = parts.generator;

        let collector = CandidateCollector::new(
            SimilarityRetriever::new(parts.embedder, parts.store, config.vector_store.top_k),
            RelevanceFilter::new(generator.clone(), prompts.clone()),
        );
        let resolution_loop = ResolutionLoop::new(
            ResolutionProposer::new(generator.clone(), prompts.clone()),
            CriticValidator::new(generator.clone(), prompts.clone()),
            parts.rejections,
            metrics.clone(),
            (&config.resolution).into(),
        );

        Self::new(
            parts.ticketing.clone(),
            AttachmentAnnotator::new(parts.attachments),
            QueryExpander::new(generator.clone(), prompts.clone()),
            collector,
            resolution_loop,
            KeywordExtractor::new(generator, prompts),
            ActionDispatcher::new(parts.ticketing, parts.policy, (&config.resolution).into()),
            metrics,
        )
    }

    pub const fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Triage every open incident of `mailbox`.
    pub async fn run(&self, mailbox: &str, progress: Option<ProgressFn<'_>>) -> DomainResult<RunOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let incidents = self.ticketing.list_open(Some(mailbox)).await.map_err(|e| {
            error!(%run_id, mailbox, error = %e, "Could not list open incidents");
            e
        })?;
        info!(%run_id, mailbox, count = incidents.len(), "Starting triage run");

        let total = incidents.len();
        let mut entries = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (index, incident) in incidents.into_iter().enumerate() {
            let span = info_span!("incident", incident_id = %incident.id, index);
            match self.process(&incident).instrument(span).await {
                Ok(resolution) => entries.push(ReportEntry {
                    incident,
                    resolution,
                }),
                Err(e) => {
                    error!(incident_id = %incident.id, error = %e, "Incident processing failed");
                    self.metrics.record_processing_error(&incident.id, &e).await;
                    failures.push(IncidentFailure {
                        incident_id: incident.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
            if let Some(progress) = progress {
                progress(index + 1, total);
            }
        }

        let summary = self.metrics.summary().await;
        info!(
            %run_id,
            processed = entries.len(),
            failed = failures.len(),
            "Triage run finished"
        );
        Ok(RunOutcome {
            run_id,
            started_at,
            mailbox: mailbox.to_string(),
            entries,
            failures,
            summary,
        })
    }

    /// Triage one incident end to end.
    pub async fn process(&self, incident: &Incident) -> DomainResult<ExecutionResult> {
        let started = Instant::now();

        let annotated = self.annotator.annotate(incident).await;
        let phrasings = self.expander.expand(&annotated).await?;
        let candidates = self.collector.collect(&incident.id, &phrasings).await;
        self.metrics.record_candidates(candidates.len()).await;
        info!(
            incident_id = %incident.id,
            phrasings = phrasings.len(),
            candidates = candidates.len(),
            "Candidates collected"
        );

        let outcome = self.resolution_loop.resolve(&annotated, &candidates).await;
        let keywords = self.keywords.extract(&annotated).await;
        let result = self
            .dispatcher
            .dispatch(Some(outcome.draft), incident, &keywords)
            .await;

        let reported = result.reported_type();
        self.metrics.record_api_status(&result.api_status).await;
        self.metrics.record_incident(started.elapsed(), &reported).await;
        info!(
            incident_id = %incident.id,
            resolution = %reported,
            attempts = outcome.attempts,
            ticketing_status = %result.api_status.ticketing,
            policy_status = %result.api_status.policy,
            "Incident resolved"
        );
        Ok(result)
    }
}
