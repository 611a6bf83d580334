//! Candidate evaluation by a chat-completion language model.
//!
//! The [`Evaluator`] trait is the seam the pipeline calls; [`OpenAiEvaluator`]
//! is the production implementation. Parsing and validation of the model's
//! answer live in [`response`] so they can be tested without HTTP.

pub mod client;
mod error;
pub mod prompt;
pub mod response;

use async_trait::async_trait;

use crate::db::job_requirement_repo::JobRequirementRow;
use crate::enrichment::ProfileAnalysis;
use crate::model::Recommendation;

pub use client::OpenAiEvaluator;
pub use error::EvaluationError;
pub use response::{DetailedAnalysis, ScoredNote, SkillMatch, SkillMatches};

/// Everything the model sees about one candidate.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub job: JobRequirementRow,
    pub resume_text: String,
    pub github: Option<ProfileAnalysis>,
}

/// A validated verdict. `recommendation` always agrees with `score`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub score: u8,
    pub recommendation: Recommendation,
    pub analysis: DetailedAnalysis,
    pub model: String,
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluationError>;
}
