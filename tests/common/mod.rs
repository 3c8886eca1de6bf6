//! Common test utilities for integration tests
//!
//! Scripted collaborators wired into a full pipeline, plus canned model
//! replies for the scenarios.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use triage::adapters::mock::{
    FixedAttachmentAnalyzer, InMemorySimilarityStore, RecordingRejectionSink, RecordingTicketing,
    ScriptedPolicy, ScriptedTextGenerator, StaticEmbedder,
};
use triage::domain::models::Config;
use triage::domain::ports::PromptKind;
use triage::services::{Collaborators, PromptLibrary, TriagePipeline};
use triage::Incident;

pub const LABEL: &str = "[SPAI] ";

/// Every collaborator of a pipeline, kept concrete for assertions.
pub struct Harness {
    pub generator: Arc<ScriptedTextGenerator>,
    pub ticketing: Arc<RecordingTicketing>,
    pub policy: Arc<ScriptedPolicy>,
    pub store: Arc<InMemorySimilarityStore>,
    pub embedder: Arc<StaticEmbedder>,
    pub rejections: Arc<RecordingRejectionSink>,
}

impl Harness {
    pub fn new(
        generator: ScriptedTextGenerator,
        ticketing: RecordingTicketing,
        policy: ScriptedPolicy,
        store: InMemorySimilarityStore,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            ticketing: Arc::new(ticketing),
            policy: Arc::new(policy),
            store: Arc::new(store),
            embedder: Arc::new(StaticEmbedder::new(8)),
            rejections: Arc::new(RecordingRejectionSink::new()),
        }
    }

    pub fn pipeline(&self, config: &Config) -> TriagePipeline {
        let parts = Collaborators {
            ticketing: self.ticketing.clone(),
            policy: self.policy.clone(),
            store: self.store.clone(),
            generator: self.generator.clone(),
            embedder: self.embedder.clone(),
            attachments: Arc::new(FixedAttachmentAnalyzer::new()),
            rejections: self.rejections.clone(),
        };
        TriagePipeline::assemble(config, Arc::new(PromptLibrary::builtin()), parts)
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.resolution.label = LABEL.to_string();
    config.resolution.max_retries = 2;
    config
}

pub fn incident(id: &str) -> Incident {
    Incident::new(
        id,
        "Policy stuck in provision",
        "The policy has been in provision status for three weeks",
    )
    .with_mailbox("GR_SAL_COMP_AUTORIZACIONES")
}

/// Catalog entry as stored in the similarity store.
pub fn catalog_hit(resolution_type: &str, solution: &str) -> Value {
    json!({
        "summary": "Policy stuck in provision",
        "COMPONENTE": "Polizas",
        "RESOLUCION AUTOMÁTICA": resolution_type,
        "BUZON REASIGNACION": "",
        "SOLUCIÓN": solution
    })
}

pub fn draft_reply(resolution_type: &str, mailbox: &str, solution: &str) -> String {
    json!({
        "RESOLUCION AUTOMÁTICA": resolution_type,
        "BUZON REASIGNACION": mailbox,
        "SOLUCIÓN": solution
    })
    .to_string()
}

pub fn approved() -> String {
    json!({"status": "APPROVED", "reason": "Matches the catalog solution"}).to_string()
}

pub fn rejected(critique: &str) -> String {
    json!({
        "status": "REJECTED",
        "reason": "Does not address the incident",
        "critique": critique,
        "problem_type": "provision",
        "avoid_solution_types": ["close"],
        "recommended_approach": "check the policy first"
    })
    .to_string()
}

/// Generator with working expansion, relevance and keyword replies.
/// Proposals and critiques are left to the caller.
pub fn generator(keywords: Value) -> ScriptedTextGenerator {
    ScriptedTextGenerator::new()
        .default_text(PromptKind::ExpandQuery, r#"["policy pending provision"]"#)
        .default_text(PromptKind::Relevance, "true")
        .default_text(PromptKind::Keywords, keywords.to_string())
}
