use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use super::format::{action_keyboard, format_message};
use super::{EvaluationSummary, NotificationError, Notifier};
use crate::config::TelegramConfig;
use crate::error::ConfigError;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("hirelens/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    result: Option<SentMessage>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Bot API client posting evaluation summaries to one chat.
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    token: SecretString,
    chat_id: String,
    details_base_url: String,
}

impl TelegramNotifier {
    pub fn new(
        config: &TelegramConfig,
        token: SecretString,
        chat_id: &str,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NotificationError::Delivery(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            chat_id: chat_id.to_string(),
            details_base_url: config.details_base_url.clone(),
        })
    }

    pub fn from_config(config: &TelegramConfig) -> crate::Result<Self> {
        let chat_id = config.chat_id.as_deref().ok_or_else(|| ConfigError::Validation {
            message: "telegram.chat_id is required to send notifications".to_string(),
        })?;
        let token = config.resolve_bot_token()?;
        Ok(Self::new(config, token, chat_id)?)
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, summary: &EvaluationSummary) -> Result<String, NotificationError> {
        let body = json!({
            "chat_id": self.chat_id,
            "text": format_message(summary),
            "parse_mode": "Markdown",
            "reply_markup": action_keyboard(
                &summary.evaluation_id,
                &summary.candidate_id,
                &self.details_base_url,
            ),
        });

        // The token is part of the URL, so transport errors drop it.
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token.expose_secret());
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let reply: BotResponse = response.json().await.map_err(|e| {
            NotificationError::Delivery(format!(
                "HTTP {}: unreadable response: {}",
                status.as_u16(),
                e.without_url()
            ))
        })?;

        match reply {
            BotResponse {
                ok: true,
                result: Some(message),
                ..
            } => {
                debug!("Telegram message {} sent", message.message_id);
                Ok(message.message_id.to_string())
            }
            BotResponse { description, .. } => Err(NotificationError::Delivery(format!(
                "HTTP {}: {}",
                status.as_u16(),
                description.unwrap_or_else(|| "request rejected".to_string())
            ))),
        }
    }
}
