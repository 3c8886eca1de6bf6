//! Run metrics.
//!
//! A [`MetricsRecorder`] is created per run and shared by the resolution
//! loop and the batch pipeline. It accumulates counters in a
//! [`RunMetrics`] and produces a serialisable [`MetricsSummary`] at the end.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::errors::ExternalSystem;
use crate::domain::models::{ApiStatus, VerdictStatus};

/// A per-incident failure that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingError {
    pub timestamp: DateTime<Utc>,
    pub incident_id: String,
    pub error: String,
}

/// Raw counters for one run.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub incident_times: Vec<Duration>,
    pub resolution_types: BTreeMap<String, u32>,
    pub problem_types: BTreeMap<String, u32>,
    pub api_errors: BTreeMap<String, u32>,
    pub critic_approvals: u32,
    pub critic_rejections: u32,
    pub critic_already_tried: u32,
    pub candidates_per_incident: Vec<usize>,
    pub processing_errors: Vec<ProcessingError>,
}

impl RunMetrics {
    pub fn critic_evaluations(&self) -> u32 {
        self.critic_approvals + self.critic_rejections + self.critic_already_tried
    }

    /// Approval rate over approvals and rejections, in percent.
    pub fn approval_rate(&self) -> f64 {
        let decided = self.critic_approvals + self.critic_rejections;
        if decided == 0 {
            return 0.0;
        }
        round2(f64::from(self.critic_approvals) / f64::from(decided) * 100.0)
    }

    pub fn summary(&self, elapsed: Duration) -> MetricsSummary {
        let total_incidents = self.incident_times.len();
        let total_secs = elapsed.as_secs_f64();
        let with_candidates = self.candidates_per_incident.iter().filter(|c| **c > 0).count();
        // Failed incidents never reach `record_incident`
        let attempted = total_incidents + self.processing_errors.len();

        MetricsSummary {
            total_time_secs: round2(total_secs),
            total_incidents,
            avg_time_per_incident_secs: average(self.incident_times.iter().map(Duration::as_secs_f64)),
            incidents_per_minute: if total_secs > 0.0 {
                round2(total_incidents as f64 / total_secs * 60.0)
            } else {
                0.0
            },
            resolution_distribution: self.resolution_types.clone(),
            problem_type_distribution: self.problem_types.clone(),
            critic: CriticPerformance {
                total_evaluations: self.critic_evaluations(),
                approvals: self.critic_approvals,
                rejections: self.critic_rejections,
                already_tried: self.critic_already_tried,
                approval_rate: self.approval_rate(),
            },
            avg_candidates_per_incident: average(self.candidates_per_incident.iter().map(|c| *c as f64)),
            incidents_with_candidates: with_candidates,
            incidents_without_candidates: self.candidates_per_incident.len() - with_candidates,
            api_errors: self.api_errors.clone(),
            processing_errors: self.processing_errors.len(),
            error_rate: if attempted > 0 {
                round2(self.processing_errors.len() as f64 / attempted as f64 * 100.0)
            } else {
                0.0
            },
        }
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticPerformance {
    pub total_evaluations: u32,
    pub approvals: u32,
    pub rejections: u32,
    pub already_tried: u32,
    /// Percent of approvals over approvals plus rejections.
    pub approval_rate: f64,
}

/// End-of-run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_time_secs: f64,
    pub total_incidents: usize,
    pub avg_time_per_incident_secs: f64,
    pub incidents_per_minute: f64,
    pub resolution_distribution: BTreeMap<String, u32>,
    pub problem_type_distribution: BTreeMap<String, u32>,
    pub critic: CriticPerformance,
    pub avg_candidates_per_incident: f64,
    pub incidents_with_candidates: usize,
    pub incidents_without_candidates: usize,
    pub api_errors: BTreeMap<String, u32>,
    pub processing_errors: usize,
    pub error_rate: f64,
}

impl MetricsSummary {
    /// Log the summary and any threshold warnings.
    pub fn log(&self, approval_threshold: f64) {
        info!(
            incidents = self.total_incidents,
            total_time_secs = self.total_time_secs,
            critic_evaluations = self.critic.total_evaluations,
            approval_rate = self.critic.approval_rate,
            processing_errors = self.processing_errors,
            resolutions = ?self.resolution_distribution,
            "Run metrics"
        );

        if self.critic.total_evaluations > 0 && self.critic.approval_rate < approval_threshold {
            warn!(
                approval_rate = self.critic.approval_rate,
                threshold = approval_threshold,
                "High critic rejection rate"
            );
        }

        if self.incidents_without_candidates > self.incidents_with_candidates {
            warn!(
                without_candidates = self.incidents_without_candidates,
                with_candidates = self.incidents_with_candidates,
                "Many incidents have no matching catalog solution"
            );
        }
    }
}

/// Shared, append-only metrics accumulator for one run.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    started: Instant,
    inner: Arc<RwLock<RunMetrics>>,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            inner: Arc::new(RwLock::new(RunMetrics::default())),
        }
    }

    pub async fn record_incident(&self, elapsed: Duration, reported_type: &str) {
        let mut metrics = self.inner.write().await;
        metrics.incident_times.push(elapsed);
        *metrics.resolution_types.entry(reported_type.to_string()).or_default() += 1;
    }

    pub async fn record_candidates(&self, count: usize) {
        self.inner.write().await.candidates_per_incident.push(count);
    }

    pub async fn record_critic_decision(&self, status: VerdictStatus) {
        let mut metrics = self.inner.write().await;
        match status {
            VerdictStatus::Approved => metrics.critic_approvals += 1,
            VerdictStatus::Rejected => metrics.critic_rejections += 1,
            VerdictStatus::AlreadyTried => metrics.critic_already_tried += 1,
        }
    }

    /// Empty and `unknown` problem types are not counted.
    pub async fn record_problem_type(&self, problem_type: Option<&str>) {
        let Some(problem_type) = problem_type
            .map(str::trim)
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("unknown"))
        else {
            return;
        };
        *self
            .inner
            .write()
            .await
            .problem_types
            .entry(problem_type.to_string())
            .or_default() += 1;
    }

    pub async fn record_api_error(&self, system: ExternalSystem) {
        *self
            .inner
            .write()
            .await
            .api_errors
            .entry(system.as_str().to_string())
            .or_default() += 1;
    }

    /// Count an error for every system whose call failed.
    pub async fn record_api_status(&self, status: &ApiStatus) {
        if status.ticketing.is_error() {
            self.record_api_error(ExternalSystem::Ticketing).await;
        }
        if status.policy.is_error() {
            self.record_api_error(ExternalSystem::Policy).await;
        }
    }

    pub async fn record_processing_error(&self, incident_id: &str, error: impl ToString) {
        self.inner.write().await.processing_errors.push(ProcessingError {
            timestamp: Utc::now(),
            incident_id: incident_id.to_string(),
            error: error.to_string(),
        });
    }

    pub async fn snapshot(&self) -> RunMetrics {
        self.inner.read().await.clone()
    }

    pub async fn summary(&self) -> MetricsSummary {
        self.inner.read().await.summary(self.started.elapsed())
    }
}
