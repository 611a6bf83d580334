use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Failed to send Telegram message: {0}")]
    Delivery(String),
}

/// Failures recording a stakeholder's button press.
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("Invalid callback data format: '{0}'")]
    InvalidData(String),

    #[error("Unknown callback action '{0}'")]
    UnknownAction(String),

    #[error("Evaluation {0} not found")]
    EvaluationNotFound(String),

    #[error("Feedback for callback '{0}' was already recorded")]
    DuplicateFeedback(String),

    #[error("Invalid callback update: {0}")]
    InvalidUpdate(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
