//! Scripted in-memory collaborators for tests and dry runs.
//!
//! Every double records the calls it receives so tests can assert on
//! call counts and arguments.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult, ExternalSystem};
use crate::domain::models::{Incident, ResolutionDraft};
use crate::domain::ports::{
    AttachmentAnalyzer, EmbeddingProvider, GenerationRequest, IncidentAction, PolicyCheckRequest,
    PolicyClient, PromptKind, RejectionRecord, RejectionSink, SearchHit, SimilarityStore,
    TextGenerator, TicketingClient,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A scripted reply: text or a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    Failure(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

#[derive(Debug, Default)]
struct GeneratorScript {
    queued: HashMap<PromptKind, VecDeque<MockReply>>,
    defaults: HashMap<PromptKind, MockReply>,
    requests: Vec<GenerationRequest>,
}

/// Text generator answering from per-prompt queues. When a queue runs
/// dry the default for that prompt is used; with no default the call fails.
#[derive(Debug, Default)]
pub struct ScriptedTextGenerator {
    script: Mutex<GeneratorScript>,
}

impl ScriptedTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reply for `kind`.
    pub fn reply(self, kind: PromptKind, reply: MockReply) -> Self {
        lock(&self.script).queued.entry(kind).or_default().push_back(reply);
        self
    }

    /// Queue one text reply for `kind`.
    pub fn reply_text(self, kind: PromptKind, text: impl Into<String>) -> Self {
        self.reply(kind, MockReply::text(text))
    }

    /// Reply used for `kind` once its queue is empty.
    pub fn default_reply(self, kind: PromptKind, reply: MockReply) -> Self {
        lock(&self.script).defaults.insert(kind, reply);
        self
    }

    pub fn default_text(self, kind: PromptKind, text: impl Into<String>) -> Self {
        self.default_reply(kind, MockReply::text(text))
    }

    pub fn calls(&self, kind: PromptKind) -> usize {
        lock(&self.script)
            .requests
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    pub fn requests(&self, kind: PromptKind) -> Vec<GenerationRequest> {
        lock(&self.script)
            .requests
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedTextGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn invoke(&self, request: &GenerationRequest) -> DomainResult<String> {
        let mut script = lock(&self.script);
        script.requests.push(request.clone());
        let reply = script
            .queued
            .get_mut(&request.kind)
            .and_then(VecDeque::pop_front)
            .or_else(|| script.defaults.get(&request.kind).cloned());
        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure(message)) => {
                Err(DomainError::transport(ExternalSystem::TextGeneration, message))
            }
            None => Err(DomainError::transport(
                ExternalSystem::TextGeneration,
                format!("no scripted reply for {}", request.kind.name()),
            )),
        }
    }
}

/// Embedder returning a constant vector of the configured dimension.
#[derive(Debug)]
pub struct StaticEmbedder {
    dimension: usize,
    texts: Mutex<Vec<String>>,
    fail: bool,
}

impl StaticEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            texts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(4)
        }
    }

    pub fn embedded_texts(&self) -> Vec<String> {
        lock(&self.texts).clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    fn name(&self) -> &'static str {
        "static"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        lock(&self.texts).push(text.to_string());
        if self.fail {
            return Err(DomainError::transport(ExternalSystem::Embedding, "embedder offline"));
        }
        Ok(vec![0.5; self.dimension])
    }
}

/// Similarity store returning the same ranked hits for every query.
#[derive(Debug, Default)]
pub struct InMemorySimilarityStore {
    hits: Vec<SearchHit>,
    fail: bool,
    searches: Mutex<usize>,
    upserts: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl InMemorySimilarityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, score: f32, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.hits.push(SearchHit {
            id: Some(format!("hit-{}", self.hits.len())),
            score,
            payload,
        });
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn searches(&self) -> usize {
        *lock(&self.searches)
    }

    pub fn upserted_ids(&self) -> Vec<String> {
        lock(&self.upserts).iter().map(|(id, _)| id.clone()).collect()
    }
}

#[async_trait]
impl SimilarityStore for InMemorySimilarityStore {
    async fn search(&self, _embedding: &[f32], top_k: usize) -> DomainResult<Vec<SearchHit>> {
        *lock(&self.searches) += 1;
        if self.fail {
            return Err(DomainError::transport(ExternalSystem::SimilarityStore, "store offline"));
        }
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn upsert(&self, id: &str, _embedding: Vec<f32>, payload: Map<String, Value>) -> DomainResult<()> {
        lock(&self.upserts).push((id.to_string(), payload));
        Ok(())
    }
}

/// Ticketing double holding a fixed incident list and recording actions.
#[derive(Debug, Default)]
pub struct RecordingTicketing {
    open: Vec<Incident>,
    closed: Vec<Incident>,
    listing_failure: Option<String>,
    action_failure: Option<String>,
    actions: Mutex<Vec<(String, IncidentAction)>>,
}

impl RecordingTicketing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open(mut self, incident: Incident) -> Self {
        self.open.push(incident);
        self
    }

    pub fn with_closed(mut self, incident: Incident) -> Self {
        self.closed.push(incident);
        self
    }

    /// Fail every listing call.
    pub fn failing_listing(mut self, message: impl Into<String>) -> Self {
        self.listing_failure = Some(message.into());
        self
    }

    /// Fail every action call.
    pub fn failing_actions(mut self, message: impl Into<String>) -> Self {
        self.action_failure = Some(message.into());
        self
    }

    pub fn actions(&self) -> Vec<(String, IncidentAction)> {
        lock(&self.actions).clone()
    }
}

#[async_trait]
impl TicketingClient for RecordingTicketing {
    async fn list_open(&self, mailbox: Option<&str>) -> DomainResult<Vec<Incident>> {
        if let Some(message) = &self.listing_failure {
            return Err(DomainError::transport(ExternalSystem::Ticketing, message.clone()));
        }
        Ok(self
            .open
            .iter()
            .filter(|i| mailbox.is_none_or(|m| i.mailbox.is_empty() || i.mailbox == m))
            .cloned()
            .collect())
    }

    async fn list_closed(&self, _months: u32) -> DomainResult<Vec<Incident>> {
        if let Some(message) = &self.listing_failure {
            return Err(DomainError::transport(ExternalSystem::Ticketing, message.clone()));
        }
        Ok(self.closed.clone())
    }

    async fn apply_action(&self, incident_id: &str, action: &IncidentAction) -> DomainResult<()> {
        lock(&self.actions).push((incident_id.to_string(), action.clone()));
        match &self.action_failure {
            Some(message) => Err(DomainError::transport(ExternalSystem::Ticketing, message.clone())),
            None => Ok(()),
        }
    }
}

/// A scripted policy-check answer.
#[derive(Debug, Clone)]
pub enum PolicyReply {
    Draft(ResolutionDraft),
    Failure(String),
}

/// Policy double answering check requests from a queue.
#[derive(Debug, Default)]
pub struct ScriptedPolicy {
    replies: Mutex<VecDeque<PolicyReply>>,
    repeat_last: Option<PolicyReply>,
    policies: HashMap<String, Value>,
    checks: Mutex<Vec<PolicyCheckRequest>>,
}

impl ScriptedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: PolicyReply) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    pub fn reply_draft(self, draft: ResolutionDraft) -> Self {
        self.reply(PolicyReply::Draft(draft))
    }

    /// Answer every check with `reply` once the queue is empty.
    pub fn always(mut self, reply: PolicyReply) -> Self {
        self.repeat_last = Some(reply);
        self
    }

    pub fn with_policy(mut self, number: impl Into<String>, record: Value) -> Self {
        self.policies.insert(number.into(), record);
        self
    }

    pub fn checks(&self) -> Vec<PolicyCheckRequest> {
        lock(&self.checks).clone()
    }
}

#[async_trait]
impl PolicyClient for ScriptedPolicy {
    async fn get_policy(&self, policy_number: &str) -> DomainResult<Value> {
        self.policies
            .get(policy_number)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("policy {policy_number}")))
    }

    async fn check_policy(&self, request: &PolicyCheckRequest) -> DomainResult<ResolutionDraft> {
        lock(&self.checks).push(request.clone());
        let reply = lock(&self.replies)
            .pop_front()
            .or_else(|| self.repeat_last.clone());
        match reply {
            Some(PolicyReply::Draft(draft)) => Ok(draft),
            Some(PolicyReply::Failure(message)) => {
                Err(DomainError::transport(ExternalSystem::Policy, message))
            }
            None => Err(DomainError::transport(
                ExternalSystem::Policy,
                "no scripted policy reply",
            )),
        }
    }
}

/// Rejection sink keeping every record in memory.
#[derive(Debug, Default)]
pub struct RecordingRejectionSink {
    records: Mutex<Vec<RejectionRecord>>,
}

impl RecordingRejectionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RejectionRecord> {
        lock(&self.records).clone()
    }
}

#[async_trait]
impl RejectionSink for RecordingRejectionSink {
    async fn record(&self, record: &RejectionRecord) -> DomainResult<()> {
        lock(&self.records).push(record.clone());
        Ok(())
    }
}

/// Attachment analyzer returning a fixed description per reference.
#[derive(Debug, Default)]
pub struct FixedAttachmentAnalyzer {
    descriptions: HashMap<String, MockReply>,
}

impl FixedAttachmentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe_as(mut self, reference: impl Into<String>, reply: MockReply) -> Self {
        self.descriptions.insert(reference.into(), reply);
        self
    }
}

#[async_trait]
impl AttachmentAnalyzer for FixedAttachmentAnalyzer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn describe(&self, reference: &str) -> DomainResult<String> {
        match self.descriptions.get(reference) {
            Some(MockReply::Text(text)) => Ok(text.clone()),
            Some(MockReply::Failure(message)) => Err(DomainError::transport(
                ExternalSystem::AttachmentAnalysis,
                message.clone(),
            )),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generator_queue_then_default() {
        let generator = ScriptedTextGenerator::new()
            .reply_text(PromptKind::Relevance, "first")
            .default_text(PromptKind::Relevance, "again");
        let request = GenerationRequest {
            kind: PromptKind::Relevance,
            system: String::new(),
            user: String::new(),
        };

        assert_eq!(generator.invoke(&request).await.unwrap(), "first");
        assert_eq!(generator.invoke(&request).await.unwrap(), "again");
        assert_eq!(generator.invoke(&request).await.unwrap(), "again");
        assert_eq!(generator.calls(PromptKind::Relevance), 3);
        assert_eq!(generator.calls(PromptKind::Critique), 0);
    }

    #[tokio::test]
    async fn test_generator_without_script_fails() {
        let generator = ScriptedTextGenerator::new();
        let request = GenerationRequest {
            kind: PromptKind::Keywords,
            system: String::new(),
            user: String::new(),
        };
        let err = generator.invoke(&request).await.unwrap_err();
        assert_eq!(err.system(), Some(ExternalSystem::TextGeneration));
    }

    #[tokio::test]
    async fn test_ticketing_records_actions() {
        let ticketing = RecordingTicketing::new().failing_actions("down");
        let action = IncidentAction::Hold { detail: "x".into() };
        assert!(ticketing.apply_action("INC-1", &action).await.is_err());
        assert_eq!(ticketing.actions(), vec![("INC-1".to_string(), action)]);
    }
}
