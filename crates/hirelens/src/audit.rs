//! Per-candidate audit trail.
//!
//! Recording never fails from the caller's point of view: a sink logs its
//! own errors and carries on, so a broken audit table cannot abort a run.

use std::time::Instant;

use log::warn;
use serde_json::{json, Value};

use crate::db::processing_log_repo;
use crate::db::Database;
use crate::model::{LogStatus, Stage};

pub use crate::db::processing_log_repo::NewLogEntry as AuditEntry;

impl AuditEntry {
    pub fn new(candidate_id: &str, stage: Stage, status: LogStatus) -> Self {
        Self {
            candidate_id: candidate_id.to_string(),
            stage,
            status,
            message: None,
            error_message: None,
            metadata: json!({}),
            duration_seconds: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Appends entries to the `processing_logs` table.
pub struct DbAuditSink {
    db: Database,
}

impl DbAuditSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl AuditSink for DbAuditSink {
    fn record(&self, entry: AuditEntry) {
        if let Err(e) = processing_log_repo::insert(&self.db, &entry) {
            warn!(
                "Failed to record {}/{} audit entry for {}: {}",
                entry.stage, entry.status, entry.candidate_id, e
            );
        }
    }
}

/// An open stage. Writes `in_progress` when started; consuming it writes the
/// single outcome entry with the elapsed time.
#[must_use = "a stage must be closed with completed, failed or skipped"]
pub struct StageTimer<'a> {
    sink: &'a dyn AuditSink,
    candidate_id: String,
    stage: Stage,
    started: Instant,
}

impl<'a> StageTimer<'a> {
    pub fn start(sink: &'a dyn AuditSink, candidate_id: &str, stage: Stage, message: &str) -> Self {
        sink.record(AuditEntry::new(candidate_id, stage, LogStatus::InProgress).with_message(message));
        Self {
            sink,
            candidate_id: candidate_id.to_string(),
            stage,
            started: Instant::now(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn completed(self, message: impl Into<String>, metadata: Value) {
        let entry = self.outcome(LogStatus::Completed).with_message(message).with_metadata(metadata);
        self.sink.record(entry);
    }

    pub fn failed(self, message: impl Into<String>, error: impl Into<String>) {
        let entry = self.outcome(LogStatus::Failed).with_message(message).with_error(error);
        self.sink.record(entry);
    }

    pub fn skipped(self, message: impl Into<String>) {
        let entry = self.outcome(LogStatus::Skipped).with_message(message);
        self.sink.record(entry);
    }

    fn outcome(&self, status: LogStatus) -> AuditEntry {
        AuditEntry::new(&self.candidate_id, self.stage, status)
            .with_duration(self.started.elapsed().as_secs_f64())
    }
}
