//! Run report output: `<dir>/report<YYYYMMDD_HHMM>.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

use crate::services::ReportEntry;

/// Writes the ordered incident/resolution pairs of a run.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, at: DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("report{}.json", at.format("%Y%m%d_%H%M")))
    }

    /// Write `entries` as a JSON array, stamped with the current local time.
    pub async fn write(&self, entries: &[ReportEntry]) -> Result<PathBuf> {
        self.write_at(entries, Local::now()).await
    }

    pub async fn write_at(&self, entries: &[ReportEntry], at: DateTime<Local>) -> Result<PathBuf> {
        let path = self.path_for(at);
        let body =
            serde_json::to_string_pretty(entries).context("failed to serialize run report")?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create report directory {}", self.dir.display()))?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write report {}", path.display()))?;

        info!(path = %path.display(), entries = entries.len(), "run report written");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
