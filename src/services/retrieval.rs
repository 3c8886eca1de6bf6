//! Candidate retrieval: similarity search plus model relevance judgment.
//!
//! For each phrasing the text is embedded, the store is searched for the
//! nearest prior cases, and every hit is judged by the model. Relevant
//! hits from all phrasings are pooled in order. Hits repeated across
//! phrasings are kept.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::prompts::PromptLibrary;
use crate::domain::errors::DomainResult;
use crate::domain::models::CandidateSolution;
use crate::domain::ports::{EmbeddingProvider, PromptKind, SimilarityStore, TextGenerator};

/// Token whose presence in a relevance reply marks the hit as relevant.
const RELEVANT_TOKEN: &str = "true";

/// Nearest prior cases for a text.
pub struct SimilarityRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn SimilarityStore>,
    top_k: usize,
}

impl SimilarityRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn SimilarityStore>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    pub async fn retrieve(&self, text: &str) -> DomainResult<Vec<CandidateSolution>> {
        let embedding = self.embedder.embed(text).await?;
        let hits = self.store.search(&embedding, self.top_k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| CandidateSolution::from_payload(hit.score, hit.payload))
            .collect())
    }
}

/// Binary model judgment of whether a candidate applies.
pub struct RelevanceFilter {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
}

impl RelevanceFilter {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLibrary>) -> Self {
        Self { generator, prompts }
    }

    pub async fn is_relevant(&self, query: &str, candidate: &CandidateSolution) -> DomainResult<bool> {
        let candidate_json = serde_json::to_string(&candidate_view(candidate))?;
        let request = self.prompts.request(
            PromptKind::Relevance,
            &[("incident", query), ("candidate", &candidate_json)],
        );
        let reply = self.generator.invoke(&request).await?;
        Ok(reply.to_lowercase().contains(RELEVANT_TOKEN))
    }
}

fn candidate_view(candidate: &CandidateSolution) -> Value {
    serde_json::json!({
        "summary": candidate.summary,
        "metadata": candidate.metadata,
    })
}

/// Retrieval and filtering over all phrasings of one incident.
pub struct CandidateCollector {
    retriever: SimilarityRetriever,
    filter: RelevanceFilter,
}

impl CandidateCollector {
    pub fn new(retriever: SimilarityRetriever, filter: RelevanceFilter) -> Self {
        Self { retriever, filter }
    }

    /// Relevant candidates for one phrasing. Any failure on this path
    /// yields no candidates.
    pub async fn relevant_for(&self, incident_id: &str, phrasing: &str) -> Vec<CandidateSolution> {
        match self.try_relevant_for(phrasing).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(incident_id, error = %e, "Candidate retrieval failed, continuing without candidates");
                Vec::new()
            }
        }
    }

    async fn try_relevant_for(&self, phrasing: &str) -> DomainResult<Vec<CandidateSolution>> {
        let hits = self.retriever.retrieve(phrasing).await?;
        let total = hits.len();
        let mut relevant = Vec::with_capacity(total);
        for candidate in hits {
            if self.filter.is_relevant(phrasing, &candidate).await? {
                relevant.push(candidate);
            }
        }
        debug!(total, relevant = relevant.len(), "Filtered similar cases");
        Ok(relevant)
    }

    /// Pool relevant candidates across phrasings, in phrasing order.
    pub async fn collect(&self, incident_id: &str, phrasings: &[String]) -> Vec<CandidateSolution> {
        let mut pool = Vec::new();
        for (index, phrasing) in phrasings.iter().enumerate() {
            let found = self.relevant_for(incident_id, phrasing).await;
            debug!(incident_id, phrasing = index, found = found.len(), "Phrasing searched");
            pool.extend(found);
        }
        pool
    }
}
