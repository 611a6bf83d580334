//! GitHub REST API client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{EnrichmentError, EnrichmentResult, GithubProfile, ProfileFetcher, Repository};
use crate::config::GithubConfig;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub's maximum page size.
const MAX_PER_PAGE: usize = 100;

const USER_AGENT: &str = concat!("hirelens/", env!("CARGO_PKG_VERSION"));

/// Repository as GitHub returns it. Kept apart from [`Repository`] because
/// GitHub sends both `forks` and `forks_count`.
#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    description: Option<String>,
    language: Option<String>,
    stargazers_count: u64,
    forks_count: u64,
    fork: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    topics: Vec<String>,
}

impl From<ApiRepository> for Repository {
    fn from(api: ApiRepository) -> Self {
        Self {
            name: api.name,
            description: api.description,
            language: api.language,
            stars: api.stargazers_count,
            forks: api.forks_count,
            is_fork: api.fork,
            created_at: api.created_at,
            updated_at: api.updated_at,
            size: api.size,
            topics: api.topics,
        }
    }
}

pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
    max_repos: usize,
}

impl GitHubClient {
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        max_repos: usize,
        timeout: Duration,
    ) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EnrichmentError::Transient(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            max_repos: max_repos.max(1),
        })
    }

    pub fn from_config(config: &GithubConfig) -> crate::Result<Self> {
        let token = config.resolve_token()?;
        if token.is_none() {
            debug!("No GitHub token configured; using unauthenticated rate limits");
        }
        Ok(Self::new(
            &config.base_url,
            token,
            config.max_repos,
            Duration::from_secs(config.timeout_secs),
        )?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        handle: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, EnrichmentError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| EnrichmentError::Transient(e.to_string()))?;

        let status = response.status();
        match status {
            s if s.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| EnrichmentError::Transient(format!("invalid response body: {}", e))),
            StatusCode::NOT_FOUND => Err(EnrichmentError::NotFound {
                handle: handle.to_string(),
            }),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(EnrichmentError::RateLimited(format!("HTTP {}", status.as_u16())))
            }
            other => Err(EnrichmentError::Transient(format!(
                "HTTP {} from {}",
                other.as_u16(),
                path
            ))),
        }
    }

    pub async fn fetch_profile(&self, handle: &str) -> Result<GithubProfile, EnrichmentError> {
        self.get(handle, &format!("/users/{}", handle), &[]).await
    }

    /// Owner repositories, most recently updated first, up to `max_repos`.
    /// Entries that do not deserialize are skipped.
    pub async fn fetch_repositories(
        &self,
        handle: &str,
    ) -> Result<Vec<Repository>, EnrichmentError> {
        let per_page = self.max_repos.min(MAX_PER_PAGE);
        let path = format!("/users/{}/repos", handle);
        let mut repos = Vec::new();

        for page in 1.. {
            let query = [
                ("type", "owner".to_string()),
                ("sort", "updated".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ];
            let batch: Vec<serde_json::Value> = self.get(handle, &path, &query).await?;
            let batch_len = batch.len();

            for raw in batch {
                match serde_json::from_value::<ApiRepository>(raw) {
                    Ok(api) => repos.push(Repository::from(api)),
                    Err(e) => warn!("Skipping unreadable repository for {}: {}", handle, e),
                }
                if repos.len() >= self.max_repos {
                    return Ok(repos);
                }
            }

            if batch_len < per_page {
                break;
            }
        }

        Ok(repos)
    }
}

#[async_trait]
impl ProfileFetcher for GitHubClient {
    async fn fetch(&self, handle: &str) -> Result<EnrichmentResult, EnrichmentError> {
        let profile = self.fetch_profile(handle).await?;
        let repositories = self.fetch_repositories(handle).await?;
        debug!(
            "Fetched GitHub profile {} with {} repositories",
            handle,
            repositories.len()
        );
        Ok(EnrichmentResult {
            profile,
            repositories,
        })
    }
}
