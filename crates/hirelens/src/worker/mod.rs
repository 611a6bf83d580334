//! Background execution of candidate runs.

pub mod job;
pub mod pool;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::WorkerError;

pub use job::{RunJob, RunOutcome, RunStatus};
pub use pool::WorkerPool;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Candidate {0} is already being processed")]
    AlreadyProcessing(String),

    #[error("Candidate {0} not found")]
    CandidateNotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}
