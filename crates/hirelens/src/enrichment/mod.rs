//! Public code-hosting profile enrichment.
//!
//! A [`ProfileFetcher`] turns a detected handle into profile and repository
//! metadata; [`analysis::analyze`] condenses the repositories into the
//! metrics the evaluator and the report use.

pub mod analysis;
pub mod client;
mod error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use analysis::{analyze, ProfileAnalysis};
pub use client::GitHubClient;
pub use error::EnrichmentError;

/// The subset of a GitHub user we keep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Repository metadata as stored with the enrichment profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub is_fork: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub size: u64,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Everything one fetch returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub profile: GithubProfile,
    pub repositories: Vec<Repository>,
}

#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(&self, handle: &str) -> Result<EnrichmentResult, EnrichmentError>;
}
