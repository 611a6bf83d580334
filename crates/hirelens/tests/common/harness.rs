//! Test harness for isolated pipeline runs.
//!
//! Each `TestHarness` owns an in-memory database and a temporary blob store.
//! Candidates enter through intake exactly as they do in production; the
//! network collaborators are supplied per test.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use hirelens::audit::DbAuditSink;
use hirelens::db::candidate_repo::{self, CandidateRow, Claim};
use hirelens::db::job_requirement_repo::{self, JobRequirementRow};
use hirelens::db::processing_log_repo::{self, LogEntryRow};
use hirelens::enrichment::ProfileFetcher;
use hirelens::evaluator::Evaluator;
use hirelens::extractor::{Extractor, TextEncoding};
use hirelens::intake::{submit_resumes, IntakeLimits, SubmitRequest, UploadedFile};
use hirelens::model::{LogStatus, Stage};
use hirelens::notifier::Notifier;
use hirelens::pipeline::{Pipeline, PipelineConfig, PipelineServices};
use hirelens::report::ReportGenerator;
use hirelens::storage::{BlobStore, FileBlobStore};
use hirelens::worker::RunJob;
use hirelens::Database;

/// Collaborators for one pipeline. `None` disables the stage, except for
/// `blobs`, which falls back to the harness's own store.
pub struct Collaborators {
    pub evaluator: Arc<dyn Evaluator>,
    pub fetcher: Option<Arc<dyn ProfileFetcher>>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub blobs: Option<Arc<dyn BlobStore>>,
}

impl Collaborators {
    pub fn evaluator(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            evaluator,
            fetcher: None,
            notifier: None,
            blobs: None,
        }
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ProfileFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn blobs(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub storage_dir: PathBuf,
    run_counter: std::cell::Cell<u32>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage_dir = temp_dir.path().join("storage");
        std::fs::create_dir_all(&storage_dir).expect("Failed to create storage dir");
        let db = Database::open_in_memory().expect("Failed to open database");

        Self {
            temp_dir,
            db,
            storage_dir,
            run_counter: std::cell::Cell::new(0),
        }
    }

    pub fn blobs(&self) -> FileBlobStore {
        FileBlobStore::new(&self.storage_dir)
    }

    pub fn requirement(&self) -> JobRequirementRow {
        let mut req = JobRequirementRow::new("Backend Engineer", "Build and run Rust services");
        req.required_skills = vec!["Rust".to_string(), "SQL".to_string()];
        req.nice_to_have_skills = vec!["Kubernetes".to_string()];
        req.min_experience_years = 3;
        job_requirement_repo::insert(&self.db, &req).expect("Failed to insert requirement");
        req
    }

    /// Submits one resume through intake and returns the pending candidate.
    pub fn submit(&self, requirement: &JobRequirementRow, filename: &str, content: &[u8]) -> CandidateRow {
        let request = SubmitRequest {
            requirement_id: requirement.id.clone(),
            files: vec![UploadedFile {
                filename: filename.to_string(),
                bytes: content.to_vec(),
            }],
            name: Some("Jane Doe".to_string()),
            email: Some(format!("{}@example.com", filename.replace('.', "-"))),
            ..Default::default()
        };
        let outcome = submit_resumes(&self.db, &self.blobs(), IntakeLimits::default(), &request)
            .expect("Intake failed");
        let id = &outcome.created[0].candidate_id;
        self.candidate(id)
    }

    /// Claims the candidate the way a trigger does and returns the job.
    pub fn claim(&self, candidate_id: &str) -> RunJob {
        let n = self.run_counter.get() + 1;
        self.run_counter.set(n);
        let handle = format!("run-{}", n);
        let claim = candidate_repo::claim_run(&self.db, candidate_id, &handle).expect("claim failed");
        assert_eq!(claim, Claim::Claimed, "candidate {} was not claimable", candidate_id);
        RunJob::new(candidate_id, &handle)
    }

    pub fn pipeline(&self, collaborators: Collaborators) -> Pipeline {
        self.pipeline_with_config(collaborators, PipelineConfig::default())
    }

    pub fn pipeline_with_config(&self, collaborators: Collaborators, config: PipelineConfig) -> Pipeline {
        let blobs = collaborators
            .blobs
            .unwrap_or_else(|| Arc::new(self.blobs()));
        Pipeline::new(
            config,
            PipelineServices {
                db: self.db.clone(),
                blobs,
                extractor: Extractor::new(vec![TextEncoding::Utf8, TextEncoding::Windows1252]),
                fetcher: collaborators.fetcher,
                evaluator: collaborators.evaluator,
                reports: ReportGenerator::new(),
                notifier: collaborators.notifier,
                audit: Arc::new(DbAuditSink::new(self.db.clone())),
            },
        )
    }

    /// Config for run-level retries without waiting.
    pub fn immediate_retries(max_run_attempts: u32) -> PipelineConfig {
        PipelineConfig {
            max_run_attempts,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn candidate(&self, id: &str) -> CandidateRow {
        candidate_repo::find_by_id(&self.db, id)
            .expect("query failed")
            .expect("candidate missing")
    }

    pub fn logs(&self, candidate_id: &str) -> Vec<LogEntryRow> {
        processing_log_repo::list_by_candidate(&self.db, candidate_id).expect("query failed")
    }

    /// Entries for `stage` with `status`.
    pub fn entries(&self, candidate_id: &str, stage: Stage, status: LogStatus) -> Vec<LogEntryRow> {
        self.logs(candidate_id)
            .into_iter()
            .filter(|e| e.stage == stage && e.status == status)
            .collect()
    }

    pub fn temp_path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}
