//! Similarity store port.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::DomainResult;

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: Option<String>,
    pub score: f32,
    pub payload: Map<String, Value>,
}

/// Vector store holding the catalog of prior cases.
#[async_trait]
pub trait SimilarityStore: Send + Sync {
    /// Return up to `top_k` nearest hits, best first.
    async fn search(&self, embedding: &[f32], top_k: usize) -> DomainResult<Vec<SearchHit>>;

    /// Insert or replace one catalog entry.
    async fn upsert(&self, id: &str, embedding: Vec<f32>, payload: Map<String, Value>) -> DomainResult<()>;
}
