//! Candidate repository: rows plus the run-status state machine.
//!
//! Status changes go through three guarded writes:
//!
//! - [`claim_run`] flips a non-processing candidate to `processing` and
//!   records a fresh run handle. It is the only way a trigger starts a run.
//! - [`begin_run`] is the worker's check that the handle it dequeued is
//!   still the live one.
//! - [`finish_run`] writes the terminal status and the closing audit entry
//!   in one transaction.

use rusqlite::{params, Connection, Row};

use crate::model::CandidateStatus;

use super::processing_log_repo::{self, NewLogEntry};
use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub id: String,
    pub requirement_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: CandidateStatus,
    pub error_message: Option<String>,
    pub run_handle: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CandidateRow {
    /// A `pending` candidate with a generated id.
    pub fn new(requirement_id: &str, name: &str, email: &str) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            requirement_id: requirement_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            linkedin_url: None,
            status: CandidateStatus::Pending,
            error_message: None,
            run_handle: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            requirement_id: row.get("requirement_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            linkedin_url: row.get("linkedin_url")?,
            status: row.get("status")?,
            error_message: row.get("error_message")?,
            run_handle: row.get("run_handle")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Result of a trigger's compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Claimed,
    AlreadyProcessing,
    NotFound,
}

pub(crate) fn insert_in(conn: &Connection, c: &CandidateRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO candidates (id, requirement_id, name, email, phone, linkedin_url,
         status, error_message, run_handle, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            c.id,
            c.requirement_id,
            c.name,
            c.email,
            c.phone,
            c.linkedin_url,
            c.status,
            c.error_message,
            c.run_handle,
            c.created_at,
            c.updated_at,
        ],
    )?;
    Ok(())
}

/// Inserts a new candidate row.
pub fn insert(db: &Database, candidate: &CandidateRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| insert_in(conn, candidate))
}

/// Finds a candidate by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<CandidateRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM candidates WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], CandidateRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Candidates sharing an email for one requirement, oldest first.
pub fn find_by_email_and_requirement(
    db: &Database,
    email: &str,
    requirement_id: &str,
) -> Result<Vec<CandidateRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM candidates WHERE email = ?1 AND requirement_id = ?2
             ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![email, requirement_id], CandidateRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Flips the candidate to `processing` unless a run is already in flight.
///
/// A single conditional UPDATE, so two racing triggers cannot both win.
pub fn claim_run(db: &Database, id: &str, run_handle: &str) -> Result<Claim, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE candidates
             SET status = 'processing', error_message = NULL, run_handle = ?2, updated_at = ?3
             WHERE id = ?1 AND status != 'processing'",
            params![id, run_handle, now_timestamp()],
        )?;
        if changed > 0 {
            return Ok(Claim::Claimed);
        }
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM candidates WHERE id = ?1)",
            params![id],
            |r| r.get(0),
        )?;
        Ok(if exists {
            Claim::AlreadyProcessing
        } else {
            Claim::NotFound
        })
    })
}

/// Re-asserts `processing` for the run identified by `run_handle`.
/// Returns false when the handle is stale.
pub fn begin_run(db: &Database, id: &str, run_handle: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE candidates SET status = 'processing', updated_at = ?3
             WHERE id = ?1 AND run_handle = ?2",
            params![id, run_handle, now_timestamp()],
        )?;
        Ok(changed > 0)
    })
}

/// Writes the run's terminal status and closing audit entry atomically.
///
/// The audit insert is best-effort: if it fails the status change still
/// commits. Returns false (and writes nothing) when the handle is stale.
pub fn finish_run(
    db: &Database,
    id: &str,
    run_handle: &str,
    status: CandidateStatus,
    error_message: Option<&str>,
    entry: &NewLogEntry,
) -> Result<bool, DatabaseError> {
    db.with_transaction(|tx| {
        let changed = tx.execute(
            "UPDATE candidates SET status = ?3, error_message = ?4, updated_at = ?5
             WHERE id = ?1 AND run_handle = ?2",
            params![id, run_handle, status, error_message, now_timestamp()],
        )?;
        if changed == 0 {
            return Ok(false);
        }
        if let Err(e) = processing_log_repo::insert_in(tx, entry) {
            log::warn!("Failed to record {} entry for {}: {}", entry.stage, id, e);
        }
        Ok(true)
    })
}

/// Deletes a candidate; resume, enrichment, evaluations, feedback and
/// audit rows go with it.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM candidates WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}
