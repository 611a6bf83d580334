//! Processing log repository, the append-only audit trail.
//!
//! Rows are only ever inserted. Ordering is by the autoincrement id, which
//! matches creation order even when timestamps collide.

use rusqlite::{params, Connection, Row};

use crate::model::{LogStatus, Stage};

use super::{now_timestamp, Database, DatabaseError};

/// An entry about to be appended.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub candidate_id: String,
    pub stage: Stage,
    pub status: LogStatus,
    pub message: Option<String>,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub duration_seconds: Option<f64>,
}

/// A stored audit entry.
#[derive(Debug, Clone)]
pub struct LogEntryRow {
    pub id: i64,
    pub candidate_id: String,
    pub stage: Stage,
    pub status: LogStatus,
    pub message: Option<String>,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub duration_seconds: Option<f64>,
    pub created_at: String,
}

impl LogEntryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let metadata: String = row.get("metadata")?;
        Ok(Self {
            id: row.get("id")?,
            candidate_id: row.get("candidate_id")?,
            stage: row.get("stage")?,
            status: row.get("status")?,
            message: row.get("message")?,
            error_message: row.get("error_message")?,
            metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
            duration_seconds: row.get("duration_seconds")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Appends an entry on an already-locked connection (or open transaction).
pub(crate) fn insert_in(conn: &Connection, entry: &NewLogEntry) -> Result<i64, DatabaseError> {
    let metadata = serde_json::to_string(&entry.metadata).map_err(|e| DatabaseError::Json {
        column: "metadata",
        source: e,
    })?;
    conn.execute(
        "INSERT INTO processing_logs (candidate_id, stage, status, message, error_message,
         metadata, duration_seconds, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.candidate_id,
            entry.stage,
            entry.status,
            entry.message,
            entry.error_message,
            metadata,
            entry.duration_seconds,
            now_timestamp(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Appends an entry and returns its id.
pub fn insert(db: &Database, entry: &NewLogEntry) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| insert_in(conn, entry))
}

/// All entries for a candidate, oldest first.
pub fn list_by_candidate(
    db: &Database,
    candidate_id: &str,
) -> Result<Vec<LogEntryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM processing_logs WHERE candidate_id = ?1 ORDER BY id ASC")?;
        let rows = stmt
            .query_map(params![candidate_id], LogEntryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts entries for a candidate with the given stage and status.
pub fn count_by_stage(
    db: &Database,
    candidate_id: &str,
    stage: Stage,
    status: LogStatus,
) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM processing_logs
             WHERE candidate_id = ?1 AND stage = ?2 AND status = ?3",
            params![candidate_id, stage, status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seed_candidate;

    fn entry(candidate_id: &str, stage: Stage, status: LogStatus) -> NewLogEntry {
        NewLogEntry {
            candidate_id: candidate_id.to_string(),
            stage,
            status,
            message: Some("msg".to_string()),
            error_message: None,
            metadata: serde_json::json!({"k": 1}),
            duration_seconds: Some(0.5),
        }
    }

    #[test]
    fn test_entries_listed_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let candidate = seed_candidate(&db);

        insert(&db, &entry(&candidate.id, Stage::PipelineStart, LogStatus::Started)).unwrap();
        insert(&db, &entry(&candidate.id, Stage::ResumeParsing, LogStatus::InProgress)).unwrap();
        insert(&db, &entry(&candidate.id, Stage::ResumeParsing, LogStatus::Completed)).unwrap();

        let rows = list_by_candidate(&db, &candidate.id).unwrap();
        let stages: Vec<(Stage, LogStatus)> = rows.iter().map(|r| (r.stage, r.status)).collect();
        assert_eq!(
            stages,
            vec![
                (Stage::PipelineStart, LogStatus::Started),
                (Stage::ResumeParsing, LogStatus::InProgress),
                (Stage::ResumeParsing, LogStatus::Completed),
            ]
        );
        assert_eq!(rows[0].metadata["k"], 1);
        assert_eq!(rows[0].duration_seconds, Some(0.5));
    }

    #[test]
    fn test_count_by_stage() {
        let db = Database::open_in_memory().unwrap();
        let candidate = seed_candidate(&db);
        insert(&db, &entry(&candidate.id, Stage::ResumeParsing, LogStatus::Failed)).unwrap();

        assert_eq!(
            count_by_stage(&db, &candidate.id, Stage::ResumeParsing, LogStatus::Failed).unwrap(),
            1
        );
        assert_eq!(
            count_by_stage(&db, &candidate.id, Stage::ResumeParsing, LogStatus::Completed)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_entry_for_unknown_candidate_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(insert(&db, &entry("ghost", Stage::PipelineStart, LogStatus::Started)).is_err());
    }
}
