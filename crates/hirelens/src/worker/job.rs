use crate::pipeline::PipelineWarning;

/// One queued run attempt for a claimed candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunJob {
    pub candidate_id: String,
    /// Handle recorded by the claim; a run whose handle is no longer the
    /// candidate's is dropped.
    pub run_handle: String,
    /// 1-based attempt counter.
    pub attempt: u32,
}

impl RunJob {
    pub fn new(candidate_id: &str, run_handle: &str) -> Self {
        Self {
            candidate_id: candidate_id.to_string(),
            run_handle: run_handle.to_string(),
            attempt: 1,
        }
    }

    /// The same run, one attempt later.
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
    /// Another trigger claimed the candidate; nothing was written.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub job: RunJob,
    pub status: RunStatus,
    pub evaluation_id: Option<String>,
    pub error: Option<String>,
    pub warnings: Vec<PipelineWarning>,
    /// A later attempt of the same run has been scheduled.
    pub retry_scheduled: bool,
}

impl RunOutcome {
    pub fn completed(
        job: RunJob,
        evaluation_id: Option<String>,
        warnings: Vec<PipelineWarning>,
    ) -> Self {
        Self {
            job,
            status: RunStatus::Completed,
            evaluation_id,
            error: None,
            warnings,
            retry_scheduled: false,
        }
    }

    pub fn failed(
        job: RunJob,
        error: String,
        warnings: Vec<PipelineWarning>,
        retry_scheduled: bool,
    ) -> Self {
        Self {
            job,
            status: RunStatus::Failed,
            evaluation_id: None,
            error: Some(error),
            warnings,
            retry_scheduled,
        }
    }

    pub fn superseded(job: RunJob) -> Self {
        Self {
            job,
            status: RunStatus::Superseded,
            evaluation_id: None,
            error: None,
            warnings: Vec::new(),
            retry_scheduled: false,
        }
    }

    /// No further outcome will arrive for this run.
    pub fn is_final(&self) -> bool {
        !self.retry_scheduled
    }

    pub fn candidate_id(&self) -> &str {
        &self.job.candidate_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_attempt_keeps_handle() {
        let job = RunJob::new("cand-1", "run-1");
        assert_eq!(job.attempt, 1);

        let retry = job.next_attempt();
        assert_eq!(retry.attempt, 2);
        assert_eq!(retry.candidate_id, "cand-1");
        assert_eq!(retry.run_handle, "run-1");
    }

    #[test]
    fn test_outcome_finality() {
        let job = RunJob::new("cand-1", "run-1");
        let retrying = RunOutcome::failed(job.clone(), "AI service timeout: x".into(), vec![], true);
        assert_eq!(retrying.status, RunStatus::Failed);
        assert!(!retrying.is_final());

        let done = RunOutcome::completed(job.clone(), Some("eval-1".into()), vec![]);
        assert!(done.is_final());
        assert_eq!(done.error, None);

        let dropped = RunOutcome::superseded(job);
        assert_eq!(dropped.status, RunStatus::Superseded);
        assert!(dropped.is_final());
    }
}
