use crate::db::candidate_repo::CandidateRow;
use crate::db::job_requirement_repo::JobRequirementRow;
use crate::db::resume_repo::ResumeRow;
use crate::enrichment::ProfileAnalysis;
use crate::evaluator::EvaluationResult;
use crate::worker::job::RunJob;

use super::error::PipelineWarning;

/// A verdict and the id of the evaluation row it was saved as.
#[derive(Debug, Clone)]
pub struct StoredEvaluation {
    pub id: String,
    pub result: EvaluationResult,
}

/// State threaded through the stages of one run.
pub struct RunContext {
    pub job: RunJob,

    // Loaded before the first stage
    pub candidate: CandidateRow,
    pub requirement: JobRequirementRow,
    pub resume: ResumeRow,

    // resume_parsing: Some once the stage completed
    pub resume_text: Option<String>,

    // github_detection / github_fetch
    pub github_handle: Option<String>,
    pub github_analysis: Option<ProfileAnalysis>,

    // ai_evaluation: Some once the run completed
    pub evaluation: Option<StoredEvaluation>,

    // document_generation
    pub report_ref: Option<String>,

    // telegram_notification
    pub notification_message_id: Option<String>,

    pub warnings: Vec<PipelineWarning>,
}

impl RunContext {
    pub fn new(
        job: RunJob,
        candidate: CandidateRow,
        requirement: JobRequirementRow,
        resume: ResumeRow,
    ) -> Self {
        Self {
            job,
            candidate,
            requirement,
            resume,
            resume_text: None,
            github_handle: None,
            github_analysis: None,
            evaluation: None,
            report_ref: None,
            notification_message_id: None,
            warnings: Vec::new(),
        }
    }
}
