//! Qdrant REST adapter for the similarity store.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::http::{build_client, endpoint, send, send_json};
use crate::domain::errors::{DomainResult, ExternalSystem};
use crate::domain::models::VectorStoreConfig;
use crate::domain::ports::{SearchHit, SimilarityStore};

const SYSTEM: ExternalSystem = ExternalSystem::SimilarityStore;

#[derive(Debug, Clone)]
pub struct QdrantStore {
    http: Client,
    url: String,
    collection: String,
}

impl QdrantStore {
    pub fn new(config: &VectorStoreConfig) -> DomainResult<Self> {
        Ok(Self {
            http: build_client(SYSTEM, config.timeout_secs)?,
            url: config.url.clone(),
            collection: config.collection.clone(),
        })
    }

    fn points_url(&self, suffix: &str) -> String {
        endpoint(&self.url, &format!("/collections/{}/points{suffix}", self.collection))
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    id: Option<Value>,
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: [Point<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Point<'a> {
    id: &'a str,
    vector: Vec<f32>,
    payload: Map<String, Value>,
}

#[async_trait]
impl SimilarityStore for QdrantStore {
    async fn search(&self, embedding: &[f32], top_k: usize) -> DomainResult<Vec<SearchHit>> {
        let body = SearchRequest {
            vector: embedding,
            limit: top_k,
            with_payload: true,
        };
        let response: SearchResponse =
            send_json(SYSTEM, self.http.post(self.points_url("/search")).json(&body)).await?;

        let hits: Vec<SearchHit> = response
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: point.id.map(|id| match id {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
                score: point.score,
                payload: point.payload.unwrap_or_default(),
            })
            .collect();
        debug!(collection = %self.collection, hits = hits.len(), "Similarity search");
        Ok(hits)
    }

    async fn upsert(&self, id: &str, embedding: Vec<f32>, payload: Map<String, Value>) -> DomainResult<()> {
        let body = UpsertRequest {
            points: [Point {
                id,
                vector: embedding,
                payload,
            }],
        };
        send(SYSTEM, self.http.put(self.points_url("")).json(&body)).await?;
        Ok(())
    }
}
