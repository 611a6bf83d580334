//! Resume repository: one stored document per candidate.

use rusqlite::{params, Connection, Row};

use crate::model::FileKind;

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct ResumeRow {
    pub id: String,
    pub candidate_id: String,
    pub file_ref: String,
    pub original_filename: String,
    pub file_kind: FileKind,
    pub extracted_text: Option<String>,
    pub extraction_error: Option<String>,
    /// Hex SHA-256 of the uploaded bytes.
    pub fingerprint: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ResumeRow {
    pub fn new(
        candidate_id: &str,
        file_ref: &str,
        original_filename: &str,
        file_kind: FileKind,
        fingerprint: &str,
    ) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            candidate_id: candidate_id.to_string(),
            file_ref: file_ref.to_string(),
            original_filename: original_filename.to_string(),
            file_kind,
            extracted_text: None,
            extraction_error: None,
            fingerprint: fingerprint.to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            candidate_id: row.get("candidate_id")?,
            file_ref: row.get("file_ref")?,
            original_filename: row.get("original_filename")?,
            file_kind: row.get("file_kind")?,
            extracted_text: row.get("extracted_text")?,
            extraction_error: row.get("extraction_error")?,
            fingerprint: row.get("fingerprint")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub(crate) fn insert_in(conn: &Connection, r: &ResumeRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO resumes (id, candidate_id, file_ref, original_filename, file_kind,
         extracted_text, extraction_error, fingerprint, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            r.id,
            r.candidate_id,
            r.file_ref,
            r.original_filename,
            r.file_kind,
            r.extracted_text,
            r.extraction_error,
            r.fingerprint,
            r.created_at,
            r.updated_at,
        ],
    )
    .map_err(|e| DatabaseError::from_unique(e, "resume", &r.candidate_id))?;
    Ok(())
}

/// Inserts a resume. A second resume for the same candidate is a `Duplicate`.
pub fn insert(db: &Database, resume: &ResumeRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| insert_in(conn, resume))
}

pub fn find_by_candidate(
    db: &Database,
    candidate_id: &str,
) -> Result<Option<ResumeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM resumes WHERE candidate_id = ?1")?;
        let mut rows = stmt.query_map(params![candidate_id], ResumeRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Stores successfully extracted text and clears any earlier error.
pub fn record_extraction(db: &Database, candidate_id: &str, text: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE resumes SET extracted_text = ?2, extraction_error = NULL, updated_at = ?3
             WHERE candidate_id = ?1",
            params![candidate_id, text, now_timestamp()],
        )?;
        Ok(())
    })
}

/// Stores the extraction failure. Previously extracted text is dropped so
/// the row reflects the latest attempt.
pub fn record_extraction_error(
    db: &Database,
    candidate_id: &str,
    error: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE resumes SET extracted_text = NULL, extraction_error = ?2, updated_at = ?3
             WHERE candidate_id = ?1",
            params![candidate_id, error, now_timestamp()],
        )?;
        Ok(())
    })
}

/// Returns the candidate id that already holds a resume with this
/// fingerprint, for the same email and requirement.
pub fn find_duplicate(
    db: &Database,
    fingerprint: &str,
    email: &str,
    requirement_id: &str,
) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT c.id FROM resumes r JOIN candidates c ON c.id = r.candidate_id
             WHERE r.fingerprint = ?1 AND c.email = ?2 AND c.requirement_id = ?3
             ORDER BY c.created_at ASC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![fingerprint, email, requirement_id], |r| {
            r.get::<_, String>(0)
        })?;
        match rows.next() {
            Some(Ok(id)) => Ok(Some(id)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
