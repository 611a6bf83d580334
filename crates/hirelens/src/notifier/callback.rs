//! Inline-button callbacks from stakeholders.

use log::info;
use serde_json::Value;

use super::CallbackError;
use crate::db::feedback_repo::{self, FeedbackRow};
use crate::db::{evaluation_repo, Database, DatabaseError};
use crate::model::FeedbackKind;

/// One button press, independent of how it was delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEvent {
    /// Provider id of the callback query, unique per press.
    pub callback_id: Option<String>,
    /// `"{action}_{evaluation_id}"`
    pub data: String,
    pub respondent_id: String,
    pub respondent_name: Option<String>,
    pub comment: Option<String>,
    pub chat_id: Option<String>,
}

impl CallbackEvent {
    /// Reads the `callback_query` of a raw Bot API update.
    pub fn from_update(update: &Value) -> Result<Self, CallbackError> {
        let query = update
            .get("callback_query")
            .ok_or_else(|| CallbackError::InvalidUpdate("no callback_query".to_string()))?;

        let data = query
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| CallbackError::InvalidUpdate("callback_query has no data".to_string()))?;

        let from = query
            .get("from")
            .ok_or_else(|| CallbackError::InvalidUpdate("callback_query has no sender".to_string()))?;
        let respondent_id = from
            .get("id")
            .and_then(id_text)
            .ok_or_else(|| CallbackError::InvalidUpdate("sender has no id".to_string()))?;

        Ok(Self {
            callback_id: query.get("id").and_then(id_text),
            data: data.to_string(),
            respondent_id,
            respondent_name: display_name(from),
            comment: None,
            chat_id: query.pointer("/message/chat/id").and_then(id_text),
        })
    }

    /// Source identifier stored with the feedback.
    pub fn source_message_id(&self) -> String {
        match &self.callback_id {
            Some(id) => id.clone(),
            None => format!("callback_{}", self.data),
        }
    }
}

/// Ids arrive as numbers or strings depending on the field.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display_name(from: &Value) -> Option<String> {
    let first = from.get("first_name").and_then(Value::as_str);
    let last = from.get("last_name").and_then(Value::as_str);
    let full = [first, last]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !full.is_empty() {
        return Some(full);
    }
    from.get("username")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Records the feedback a callback carries.
pub fn handle_callback(db: &Database, event: &CallbackEvent) -> Result<FeedbackRow, CallbackError> {
    let (action, evaluation_id) = event
        .data
        .split_once('_')
        .filter(|(a, id)| !a.is_empty() && !id.is_empty())
        .ok_or_else(|| CallbackError::InvalidData(event.data.clone()))?;

    let kind =
        FeedbackKind::parse(action).ok_or_else(|| CallbackError::UnknownAction(action.to_string()))?;

    if evaluation_repo::find_by_id(db, evaluation_id)?.is_none() {
        return Err(CallbackError::EvaluationNotFound(evaluation_id.to_string()));
    }

    let source = event.source_message_id();
    let mut feedback = FeedbackRow::new(evaluation_id, &event.respondent_id, kind, &source);
    feedback.stakeholder_name = event.respondent_name.clone();
    feedback.comment = event.comment.clone();
    feedback.source_chat_id = event.chat_id.clone();

    feedback_repo::insert(db, &feedback).map_err(|e| match e {
        DatabaseError::Duplicate { .. } => CallbackError::DuplicateFeedback(source.clone()),
        other => CallbackError::Database(other),
    })?;

    info!(
        "Recorded {} feedback on evaluation {}",
        kind, evaluation_id
    );
    Ok(feedback)
}
