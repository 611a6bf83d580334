use thiserror::Error;

/// Failures fetching a GitHub profile. All of them are non-fatal to a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("GitHub user '{handle}' not found")]
    NotFound { handle: String },

    #[error("GitHub API rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("GitHub API error: {0}")]
    Transient(String),
}
