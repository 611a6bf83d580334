//! Stakeholder feedback repository.

use rusqlite::{params, Row};

use crate::model::FeedbackKind;

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRow {
    pub id: String,
    pub evaluation_id: String,
    pub stakeholder_id: String,
    pub stakeholder_name: Option<String>,
    pub kind: FeedbackKind,
    pub comment: Option<String>,
    /// Messaging-provider id of the callback; unique across all feedback.
    pub source_message_id: String,
    pub source_chat_id: Option<String>,
    pub created_at: String,
}

impl FeedbackRow {
    pub fn new(
        evaluation_id: &str,
        stakeholder_id: &str,
        kind: FeedbackKind,
        source_message_id: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            evaluation_id: evaluation_id.to_string(),
            stakeholder_id: stakeholder_id.to_string(),
            stakeholder_name: None,
            kind,
            comment: None,
            source_message_id: source_message_id.to_string(),
            source_chat_id: None,
            created_at: now_timestamp(),
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            evaluation_id: row.get("evaluation_id")?,
            stakeholder_id: row.get("stakeholder_id")?,
            stakeholder_name: row.get("stakeholder_name")?,
            kind: row.get("kind")?,
            comment: row.get("comment")?,
            source_message_id: row.get("source_message_id")?,
            source_chat_id: row.get("source_chat_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts feedback. A repeated `source_message_id` yields `Duplicate`.
pub fn insert(db: &Database, fb: &FeedbackRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO stakeholder_feedback (id, evaluation_id, stakeholder_id,
             stakeholder_name, kind, comment, source_message_id, source_chat_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                fb.id,
                fb.evaluation_id,
                fb.stakeholder_id,
                fb.stakeholder_name,
                fb.kind,
                fb.comment,
                fb.source_message_id,
                fb.source_chat_id,
                fb.created_at,
            ],
        )
        .map_err(|e| DatabaseError::from_unique(e, "feedback", &fb.source_message_id))?;
        Ok(())
    })
}

pub fn list_by_evaluation(
    db: &Database,
    evaluation_id: &str,
) -> Result<Vec<FeedbackRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM stakeholder_feedback WHERE evaluation_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![evaluation_id], FeedbackRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
