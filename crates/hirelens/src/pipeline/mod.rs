//! Candidate run orchestration: the stage sequence, its audit trail and the
//! decision whether a failed run is retried.

pub mod config;
pub mod context;
pub mod error;
pub mod runner;

pub use config::PipelineConfig;
pub use context::{RunContext, StoredEvaluation};
pub use error::{is_retryable_failure, PipelineError, PipelineWarning};
pub use runner::{Pipeline, PipelineServices};
