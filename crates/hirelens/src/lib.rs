pub mod audit;
pub mod config;
pub mod db;
pub mod detector;
pub mod enrichment;
pub mod error;
pub mod evaluator;
pub mod extractor;
pub mod intake;
pub mod model;
pub mod notifier;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod telemetry;
pub mod worker;

pub use audit::{AuditEntry, AuditSink, DbAuditSink, StageTimer};
pub use config::{load_config, Config};
pub use db::{Database, DatabaseError};
pub use enrichment::{GitHubClient, ProfileFetcher};
pub use error::{
    ConfigError, ExtractionError, HirelensError, Result, StorageError, WorkerError,
};
pub use evaluator::{EvaluationError, Evaluator, OpenAiEvaluator};
pub use extractor::Extractor;
pub use intake::{submit_resumes, IntakeError, IntakeLimits, SubmitRequest, UploadedFile};
pub use notifier::{handle_callback, CallbackEvent, Notifier, TelegramNotifier};
pub use pipeline::{Pipeline, PipelineConfig, PipelineServices};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use storage::{BlobStore, FileBlobStore};
pub use worker::{RunJob, RunOutcome, RunStatus, TriggerError, WorkerPool};
