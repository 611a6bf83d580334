//! Enrichment profile repository. One row per candidate, replaced on every
//! fetch attempt.

use rusqlite::{params, Row};
use serde_json::Value;

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRow {
    pub candidate_id: String,
    pub username: String,
    pub profile_url: String,
    pub profile: Value,
    pub repositories: Value,
    pub analysis: Value,
    pub fetch_error: Option<String>,
    pub fetched_at: String,
}

impl EnrichmentRow {
    /// A row recording a failed fetch: empty payloads plus the error.
    pub fn failed(candidate_id: &str, username: &str, profile_url: &str, error: &str) -> Self {
        Self {
            candidate_id: candidate_id.to_string(),
            username: username.to_string(),
            profile_url: profile_url.to_string(),
            profile: Value::Object(Default::default()),
            repositories: Value::Array(Vec::new()),
            analysis: Value::Object(Default::default()),
            fetch_error: Some(error.to_string()),
            fetched_at: now_timestamp(),
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let profile: String = row.get("profile")?;
        let repositories: String = row.get("repositories")?;
        let analysis: String = row.get("analysis")?;
        Ok(Self {
            candidate_id: row.get("candidate_id")?,
            username: row.get("username")?,
            profile_url: row.get("profile_url")?,
            profile: serde_json::from_str(&profile).unwrap_or(Value::Null),
            repositories: serde_json::from_str(&repositories).unwrap_or(Value::Null),
            analysis: serde_json::from_str(&analysis).unwrap_or(Value::Null),
            fetch_error: row.get("fetch_error")?,
            fetched_at: row.get("fetched_at")?,
        })
    }
}

fn encode(value: &Value, column: &'static str) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Json { column, source: e })
}

/// Inserts or replaces the candidate's profile in a single statement.
pub fn upsert(db: &Database, row: &EnrichmentRow) -> Result<(), DatabaseError> {
    let profile = encode(&row.profile, "profile")?;
    let repositories = encode(&row.repositories, "repositories")?;
    let analysis = encode(&row.analysis, "analysis")?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO enrichment_profiles (candidate_id, username, profile_url, profile,
             repositories, analysis, fetch_error, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(candidate_id) DO UPDATE SET
                username = excluded.username,
                profile_url = excluded.profile_url,
                profile = excluded.profile,
                repositories = excluded.repositories,
                analysis = excluded.analysis,
                fetch_error = excluded.fetch_error,
                fetched_at = excluded.fetched_at",
            params![
                row.candidate_id,
                row.username,
                row.profile_url,
                profile,
                repositories,
                analysis,
                row.fetch_error,
                row.fetched_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_candidate(
    db: &Database,
    candidate_id: &str,
) -> Result<Option<EnrichmentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM enrichment_profiles WHERE candidate_id = ?1")?;
        let mut rows = stmt.query_map(params![candidate_id], EnrichmentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
