//! Append-only audit trail of critic rejections.
//!
//! One JSON line per rejected draft, in a file per day:
//! `<dir>/rejected<YYYYMMDD>.jsonl`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{RejectionRecord, RejectionSink};

/// JSONL rejection log rooted at a directory
#[derive(Clone)]
pub struct JsonlRejectionLog {
    dir: PathBuf,
    // Serializes appends so concurrent writers never interleave lines
    write_lock: Arc<Mutex<()>>,
}

impl JsonlRejectionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that records stamped at `timestamp` go to (local calendar day).
    pub fn file_for(&self, timestamp: DateTime<Utc>) -> PathBuf {
        let day = timestamp.with_timezone(&Local).format("%Y%m%d");
        self.dir.join(format!("rejected{day}.jsonl"))
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> DomainError {
    DomainError::ExecutionFailed(format!(
        "failed to write rejection log {}: {err}",
        path.display()
    ))
}

#[async_trait]
impl RejectionSink for JsonlRejectionLog {
    async fn record(&self, record: &RejectionRecord) -> DomainResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let path = self.file_for(record.timestamp);
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, &e))?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| io_error(&path, &e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| io_error(&path, &e))?;
        file.flush().await.map_err(|e| io_error(&path, &e))?;

        debug!(
            incident_id = %record.incident_id,
            attempt = record.attempt,
            path = %path.display(),
            "rejection recorded"
        );
        Ok(())
    }
}
