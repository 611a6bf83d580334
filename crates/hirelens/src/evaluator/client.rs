use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::response::parse_evaluation;
use super::{EvaluationError, EvaluationRequest, EvaluationResult, Evaluator};
use crate::config::AiConfig;
use crate::sanitize::truncate_chars;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("hirelens/", env!("CARGO_PKG_VERSION"));

/// Upstream error bodies are cut to this many characters in messages.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client.
///
/// Rate limits and timeouts are retried up to `max_attempts` times in
/// total. A rate limit waits `retry_delay * attempt`, a timeout waits
/// `retry_delay`.
pub struct OpenAiEvaluator {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    max_attempts: u32,
    retry_delay: Duration,
    resume_char_budget: usize,
}

impl OpenAiEvaluator {
    pub fn new(config: &AiConfig, api_key: SecretString) -> Result<Self, EvaluationError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EvaluationError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            resume_char_budget: config.resume_char_budget,
        })
    }

    pub fn from_config(config: &AiConfig) -> crate::Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(config, api_key)?)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One round trip. Returns the assistant message content.
    async fn complete(&self, prompt: &str) -> Result<String, EvaluationError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EvaluationError::Timeout(e.to_string())
                } else {
                    EvaluationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_chars(text.trim(), MAX_ERROR_BODY)
            );
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => EvaluationError::RateLimited(detail),
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                    EvaluationError::Timeout(detail)
                }
                other => EvaluationError::Upstream {
                    status: other.as_u16(),
                    message: truncate_chars(text.trim(), MAX_ERROR_BODY).to_string(),
                },
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                EvaluationError::Timeout(e.to_string())
            } else {
                EvaluationError::MalformedResponse(e.to_string())
            }
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EvaluationError::MalformedResponse("response has no message content".to_string()))
    }
}

#[async_trait]
impl Evaluator for OpenAiEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluationError> {
        let prompt = build_prompt(request, self.resume_char_budget);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.complete(&prompt).await {
                Ok(content) => {
                    debug!("Model answered on attempt {}", attempt);
                    return parse_evaluation(&content, &self.model);
                }
                Err(e) if e.is_retryable() => {
                    if attempt >= self.max_attempts {
                        return Err(EvaluationError::Unavailable {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    let wait = match e {
                        EvaluationError::RateLimited(_) => self.retry_delay * attempt,
                        _ => self.retry_delay,
                    };
                    warn!(
                        "Evaluation attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, self.max_attempts, e, wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
