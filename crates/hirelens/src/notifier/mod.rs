//! Stakeholder notification and feedback.
//!
//! [`Notifier`] delivers a finished evaluation to the hiring team;
//! [`callback::handle_callback`] records what they answer through the
//! inline buttons.

pub mod callback;
mod error;
pub mod format;
pub mod telegram;

use async_trait::async_trait;

use crate::evaluator::DetailedAnalysis;
use crate::model::Recommendation;

pub use callback::{handle_callback, CallbackEvent};
pub use error::{CallbackError, NotificationError};
pub use telegram::TelegramNotifier;

/// What a notification says about one evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationSummary {
    pub evaluation_id: String,
    pub candidate_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub position: String,
    pub score: u8,
    pub recommendation: Recommendation,
    pub analysis: DetailedAnalysis,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the summary and returns the provider's message id.
    async fn notify(&self, summary: &EvaluationSummary) -> Result<String, NotificationError>;
}
