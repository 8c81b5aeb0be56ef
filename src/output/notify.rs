//! Delivery of source reports
//!
//! One message is sent per source. [`TelegramNotifier`] posts to every
//! configured chat; [`StdoutNotifier`] prints, for runs without a bot.

use crate::config::NotifyConfig;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Errors that can occur while delivering a message
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid notify endpoint: {0}")]
    Endpoint(String),

    #[error("Delivery failed for all {0} chats")]
    AllChatsFailed(usize),
}

/// A sink for report messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Telegram Bot API sink
pub struct TelegramNotifier {
    http: Client,
    endpoint: String,
    chat_ids: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(config: &NotifyConfig, http: Client) -> Self {
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            config.telegram_token
        );
        let chat_ids = config
            .chat_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        Self {
            http,
            endpoint,
            chat_ids,
        }
    }

    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), String> {
        let form = [
            ("chat_id", chat_id),
            ("text", text),
            ("disable_web_page_preview", "true"),
        ];

        let response = self
            .http
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        if self.chat_ids.is_empty() {
            return Err(NotifyError::Endpoint("no chat ids".to_string()));
        }

        let mut failed = 0;
        for chat_id in &self.chat_ids {
            // The bot token is part of the URL; errors are logged without it
            if let Err(e) = self.send_to(chat_id, text).await {
                tracing::warn!("Telegram delivery to chat {} failed: {}", chat_id, e);
                failed += 1;
            }
        }

        if failed == self.chat_ids.len() {
            return Err(NotifyError::AllChatsFailed(failed));
        }
        Ok(())
    }
}

/// Prints every message to stdout
#[derive(Debug, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        println!("{}\n", text);
        Ok(())
    }
}
