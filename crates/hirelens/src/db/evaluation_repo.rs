//! Evaluation repository.
//!
//! A candidate accumulates evaluations across runs; the one with
//! `superseded_at IS NULL` is current. A partial unique index guarantees at
//! most one current row per candidate.

use rusqlite::{params, Row};
use serde_json::Value;

use crate::model::Recommendation;

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRow {
    pub id: String,
    pub candidate_id: String,
    pub score: u8,
    pub recommendation: Recommendation,
    pub analysis: Value,
    pub report_ref: Option<String>,
    pub model: String,
    pub processing_seconds: Option<f64>,
    pub notification_message_id: Option<String>,
    pub superseded_at: Option<String>,
    pub created_at: String,
}

impl EvaluationRow {
    pub fn new(
        candidate_id: &str,
        score: u8,
        recommendation: Recommendation,
        analysis: Value,
        model: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            candidate_id: candidate_id.to_string(),
            score,
            recommendation,
            analysis,
            report_ref: None,
            model: model.to_string(),
            processing_seconds: None,
            notification_message_id: None,
            superseded_at: None,
            created_at: now_timestamp(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.superseded_at.is_none()
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let analysis: String = row.get("analysis")?;
        Ok(Self {
            id: row.get("id")?,
            candidate_id: row.get("candidate_id")?,
            score: row.get("score")?,
            recommendation: row.get("recommendation")?,
            analysis: serde_json::from_str(&analysis).unwrap_or(Value::Null),
            report_ref: row.get("report_ref")?,
            model: row.get("model")?,
            processing_seconds: row.get("processing_seconds")?,
            notification_message_id: row.get("notification_message_id")?,
            superseded_at: row.get("superseded_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Supersedes the candidate's current evaluation (if any) and inserts
/// `eval` as the new current one, atomically.
pub fn insert_current(db: &Database, eval: &EvaluationRow) -> Result<(), DatabaseError> {
    let analysis = serde_json::to_string(&eval.analysis).map_err(|e| DatabaseError::Json {
        column: "analysis",
        source: e,
    })?;
    db.with_transaction(|tx| {
        let superseded = tx.execute(
            "UPDATE evaluations SET superseded_at = ?2
             WHERE candidate_id = ?1 AND superseded_at IS NULL",
            params![eval.candidate_id, now_timestamp()],
        )?;
        if superseded > 0 {
            log::debug!("Superseded previous evaluation for {}", eval.candidate_id);
        }
        tx.execute(
            "INSERT INTO evaluations (id, candidate_id, score, recommendation, analysis,
             report_ref, model, processing_seconds, notification_message_id,
             superseded_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, ?10)",
            params![
                eval.id,
                eval.candidate_id,
                eval.score,
                eval.recommendation,
                analysis,
                eval.report_ref,
                eval.model,
                eval.processing_seconds,
                eval.notification_message_id,
                eval.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<EvaluationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM evaluations WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], EvaluationRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn find_current_by_candidate(
    db: &Database,
    candidate_id: &str,
) -> Result<Option<EvaluationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM evaluations WHERE candidate_id = ?1 AND superseded_at IS NULL",
        )?;
        let mut rows = stmt.query_map(params![candidate_id], EvaluationRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Full history, oldest first.
pub fn list_by_candidate(
    db: &Database,
    candidate_id: &str,
) -> Result<Vec<EvaluationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM evaluations WHERE candidate_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![candidate_id], EvaluationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn set_report_ref(db: &Database, id: &str, report_ref: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE evaluations SET report_ref = ?2 WHERE id = ?1",
            params![id, report_ref],
        )?;
        Ok(())
    })
}

pub fn set_notification_message_id(
    db: &Database,
    id: &str,
    message_id: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE evaluations SET notification_message_id = ?2 WHERE id = ?1",
            params![id, message_id],
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seed_candidate;
    use serde_json::json;

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        let candidate = seed_candidate(&db);
        let eval = EvaluationRow::new(
            &candidate.id,
            8,
            Recommendation::Interview,
            json!({"summary": "solid"}),
            "gpt-4o",
        );
        insert_current(&db, &eval).unwrap();

        let found = find_by_id(&db, &eval.id).unwrap().unwrap();
        assert_eq!(found, eval);
        assert!(found.is_current());
    }

    #[test]
    fn test_new_evaluation_supersedes_previous() {
        let db = Database::open_in_memory().unwrap();
        let candidate = seed_candidate(&db);
        let first = EvaluationRow::new(&candidate.id, 4, Recommendation::Decline, json!({}), "m");
        let second =
            EvaluationRow::new(&candidate.id, 7, Recommendation::Interview, json!({}), "m");
        insert_current(&db, &first).unwrap();
        insert_current(&db, &second).unwrap();

        let current = find_current_by_candidate(&db, &candidate.id)
            .unwrap()
            .unwrap();
        assert_eq!(current.id, second.id);

        let history = list_by_candidate(&db, &candidate.id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].is_current());
        assert!(history[1].is_current());
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let db = Database::open_in_memory().unwrap();
        let candidate = seed_candidate(&db);
        let eval = EvaluationRow::new(&candidate.id, 11, Recommendation::Interview, json!({}), "m");
        assert!(insert_current(&db, &eval).is_err());
        assert!(find_current_by_candidate(&db, &candidate.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_set_report_and_message_id() {
        let db = Database::open_in_memory().unwrap();
        let candidate = seed_candidate(&db);
        let eval = EvaluationRow::new(&candidate.id, 6, Recommendation::Interview, json!({}), "m");
        insert_current(&db, &eval).unwrap();

        set_report_ref(&db, &eval.id, "reports/2026/01/01/a.pdf").unwrap();
        set_notification_message_id(&db, &eval.id, "42").unwrap();

        let found = find_by_id(&db, &eval.id).unwrap().unwrap();
        assert_eq!(found.report_ref.as_deref(), Some("reports/2026/01/01/a.pdf"));
        assert_eq!(found.notification_message_id.as_deref(), Some("42"));
    }
}
