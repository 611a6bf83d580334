use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::secrets::{self, SecretError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// SQLite file; `~/.hirelens/data/hirelens.db` when absent.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_storage_directory")]
    pub storage_directory: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(secrets::expand_home(path)),
            None => crate::db::default_database_path()
                .unwrap_or_else(|| PathBuf::from("hirelens.db")),
        }
    }

    pub fn storage_directory(&self) -> PathBuf {
        PathBuf::from(secrets::expand_home(&self.storage_directory))
    }
}

fn default_storage_directory() -> String {
    "~/.hirelens/storage".to_string()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tried in order for plain-text resumes.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
}

fn default_encodings() -> Vec<String> {
    vec![
        "utf-8".to_string(),
        "latin-1".to_string(),
        "windows-1252".to_string(),
    ]
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            encodings: default_encodings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_max_files() -> usize {
    10
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_github_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_file: Option<String>,
    #[serde(default = "default_github_token_env_var")]
    pub token_env_var: Option<String>,
    #[serde(default = "default_max_repos")]
    pub max_repos: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_token_env_var() -> Option<String> {
    Some("GITHUB_TOKEN".to_string())
}

fn default_max_repos() -> usize {
    100
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_github_base_url(),
            token: None,
            token_file: None,
            token_env_var: default_github_token_env_var(),
            max_repos: default_max_repos(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl GithubConfig {
    /// The API token, if any. Unauthenticated access is allowed.
    pub fn resolve_token(&self) -> Result<Option<SecretString>, SecretError> {
        secrets::resolve_secret_optional(
            self.token.as_deref(),
            self.token_file.as_deref(),
            self.token_env_var.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_ai_api_key_env_var")]
    pub api_key_env_var: Option<String>,
    #[serde(default = "default_ai_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_ai_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    /// Resume characters sent to the model.
    #[serde(default = "default_resume_char_budget")]
    pub resume_char_budget: usize,
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-5-nano-2025-08-07".to_string()
}

fn default_ai_api_key_env_var() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_ai_max_attempts() -> u32 {
    3
}

fn default_ai_retry_delay_secs() -> u64 {
    2
}

fn default_ai_timeout_secs() -> u64 {
    120
}

fn default_resume_char_budget() -> usize {
    5000
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_ai_api_key_env_var(),
            max_attempts: default_ai_max_attempts(),
            retry_delay_secs: default_ai_retry_delay_secs(),
            timeout_secs: default_ai_timeout_secs(),
            resume_char_budget: default_resume_char_budget(),
        }
    }
}

impl AiConfig {
    /// The API key is mandatory; a run cannot evaluate without it.
    pub fn resolve_api_key(&self) -> Result<SecretString, SecretError> {
        secrets::resolve_secret(
            self.api_key.as_deref(),
            self.api_key_file.as_deref(),
            self.api_key_env_var.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub bot_token_file: Option<String>,
    #[serde(default = "default_telegram_token_env_var")]
    pub bot_token_env_var: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_details_base_url")]
    pub details_base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_telegram_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_token_env_var() -> Option<String> {
    Some("TELEGRAM_BOT_TOKEN".to_string())
}

fn default_details_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_telegram_base_url(),
            bot_token: None,
            bot_token_file: None,
            bot_token_env_var: default_telegram_token_env_var(),
            chat_id: None,
            details_base_url: default_details_base_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    pub fn resolve_bot_token(&self) -> Result<SecretString, SecretError> {
        secrets::resolve_secret(
            self.bot_token.as_deref(),
            self.bot_token_file.as_deref(),
            self.bot_token_env_var.as_deref(),
        )
    }
}

/// Whole-run retry policy for runs that failed on a rate limit or timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_run_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_run_delay_secs")]
    pub delay_secs: u64,
}

fn default_run_max_attempts() -> u32 {
    3
}

fn default_run_delay_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_run_max_attempts(),
            delay_secs: default_run_delay_secs(),
        }
    }
}
