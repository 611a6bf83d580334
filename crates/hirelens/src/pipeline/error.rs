use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::{ExtractionError, StorageError};
use crate::evaluator::EvaluationError;
use crate::model::Stage;
use crate::report::ReportError;

/// Errors that end a stage. Only extraction, evaluation and the loads that
/// precede them abort the run; the rest become [`PipelineWarning`]s.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Candidate {0} not found")]
    CandidateNotFound(String),

    #[error("Job requirement {0} not found")]
    RequirementNotFound(String),

    #[error("No resume stored for candidate {0}")]
    ResumeMissing(String),

    #[error("Resume could not be read: {0}")]
    ResumeUnreadable(StorageError),

    #[error("Resume parsing failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("AI evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ReportError),

    #[error("Report storage failed: {0}")]
    ReportStorage(StorageError),

    #[error("Failed to encode analysis: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// A non-fatal stage failure, kept on the outcome for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineWarning {
    pub stage: Stage,
    pub error: String,
}

/// Whether a run that failed with `message` is worth another attempt.
pub fn is_retryable_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("timeout")
}
