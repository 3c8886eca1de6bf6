//! Batch runs: ordering, per-incident failure isolation and run metrics.

mod common;

use common::{approved, catalog_hit, config, draft_reply, generator, incident, Harness};
use serde_json::json;
use triage::adapters::mock::{
    InMemorySimilarityStore, MockReply, RecordingTicketing, ScriptedPolicy,
};
use triage::domain::ports::PromptKind;
use triage::infrastructure::logging::JsonlRejectionLog;
use triage::infrastructure::ReportWriter;
use triage::{DomainError, ResolutionType};

fn approving_generator() -> triage::adapters::mock::ScriptedTextGenerator {
    generator(json!({"poliza": "P-1"}))
        .default_text(PromptKind::Propose, draft_reply("close", "", "Provision fixed"))
        .default_text(PromptKind::Critique, approved())
}

#[tokio::test]
async fn test_run_processes_incidents_in_listing_order() {
    let ticketing = RecordingTicketing::new()
        .with_open(incident("INC-1"))
        .with_open(incident("INC-2"))
        .with_open(incident("INC-3"));
    let harness = Harness::new(
        approving_generator(),
        ticketing,
        ScriptedPolicy::new(),
        InMemorySimilarityStore::new().with_hit(0.9, catalog_hit("cierre", "Fix provision")),
    );
    let pipeline = harness.pipeline(&config());

    let outcome = pipeline
        .run("GR_SAL_COMP_AUTORIZACIONES", None)
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.entries.iter().map(|e| e.incident.id.as_str()).collect();
    assert_eq!(ids, vec!["INC-1", "INC-2", "INC-3"]);
    assert!(outcome.failures.is_empty());
    assert!(outcome
        .entries
        .iter()
        .all(|e| e.resolution.final_type() == &ResolutionType::Close));

    let acted: Vec<String> = harness.ticketing.actions().into_iter().map(|(id, _)| id).collect();
    assert_eq!(acted, vec!["INC-1", "INC-2", "INC-3"]);

    assert_eq!(outcome.summary.total_incidents, 3);
    assert_eq!(outcome.summary.resolution_distribution["close"], 3);
    assert_eq!(outcome.summary.critic.approvals, 3);
    assert!((outcome.summary.critic.approval_rate - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_listing_failure_aborts_the_run() {
    let harness = Harness::new(
        approving_generator(),
        RecordingTicketing::new().failing_listing("connection refused"),
        ScriptedPolicy::new(),
        InMemorySimilarityStore::new(),
    );
    let pipeline = harness.pipeline(&config());

    let err = pipeline.run("GR_SAL_COMP_AUTORIZACIONES", None).await.unwrap_err();

    assert!(matches!(err, DomainError::Transport { .. }));
    assert_eq!(harness.generator.calls(PromptKind::ExpandQuery), 0);
}

#[tokio::test]
async fn test_failed_incident_is_recorded_and_run_continues() {
    let generator = approving_generator()
        .reply(PromptKind::ExpandQuery, MockReply::failure("model offline"));
    let ticketing = RecordingTicketing::new()
        .with_open(incident("INC-1"))
        .with_open(incident("INC-2"));
    let harness = Harness::new(
        generator,
        ticketing,
        ScriptedPolicy::new(),
        InMemorySimilarityStore::new().with_hit(0.9, catalog_hit("cierre", "Fix provision")),
    );
    let pipeline = harness.pipeline(&config());

    let outcome = pipeline
        .run("GR_SAL_COMP_AUTORIZACIONES", None)
        .await
        .unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].incident_id, "INC-1");
    assert!(outcome.failures[0].error.contains("model offline"));
    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].incident.id, "INC-2");
    assert_eq!(outcome.summary.processing_errors, 1);
    assert!((outcome.summary.error_rate - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_progress_reports_every_incident() {
    let ticketing = RecordingTicketing::new()
        .with_open(incident("INC-1"))
        .with_open(incident("INC-2"));
    let harness = Harness::new(
        approving_generator(),
        ticketing,
        ScriptedPolicy::new(),
        InMemorySimilarityStore::new(),
    );
    let pipeline = harness.pipeline(&config());
    let seen = std::sync::Mutex::new(Vec::new());
    let on_progress = |done: usize, total: usize| seen.lock().unwrap().push((done, total));

    pipeline
        .run("GR_SAL_COMP_AUTORIZACIONES", Some(&on_progress))
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
}

#[tokio::test]
async fn test_rejections_and_report_reach_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.resolution.max_retries = 1;

    let generator = generator(json!({}))
        .default_text(PromptKind::Propose, draft_reply("close", "", "Close it"))
        .default_text(PromptKind::Critique, common::rejected("not yet"));
    let harness = Harness::new(
        generator,
        RecordingTicketing::new().with_open(incident("INC-1")),
        ScriptedPolicy::new(),
        InMemorySimilarityStore::new().with_hit(0.9, catalog_hit("cierre", "Close it")),
    );
    let audit_dir = dir.path().join("rejected");
    let pipeline = {
        let parts = triage::services::Collaborators {
            ticketing: harness.ticketing.clone(),
            policy: harness.policy.clone(),
            store: harness.store.clone(),
            generator: harness.generator.clone(),
            embedder: harness.embedder.clone(),
            attachments: std::sync::Arc::new(triage::domain::ports::NullAttachmentAnalyzer),
            rejections: std::sync::Arc::new(JsonlRejectionLog::new(&audit_dir)),
        };
        triage::TriagePipeline::assemble(
            &config,
            std::sync::Arc::new(triage::PromptLibrary::builtin()),
            parts,
        )
    };

    let outcome = pipeline.run("GR_SAL_COMP_AUTORIZACIONES", None).await.unwrap();
    let report = ReportWriter::new(dir.path().join("reports"))
        .write(&outcome.entries)
        .await
        .unwrap();

    let audit_files: Vec<_> = std::fs::read_dir(&audit_dir).unwrap().collect();
    assert_eq!(audit_files.len(), 1);
    let audit = std::fs::read_to_string(audit_files[0].as_ref().unwrap().path()).unwrap();
    assert_eq!(audit.lines().count(), 2);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(report[0]["incident"]["codIncidencia"], "INC-1");
    assert_eq!(report[0]["resolution"]["RESOLUCION AUTOMÁTICA"], "manual");
}
