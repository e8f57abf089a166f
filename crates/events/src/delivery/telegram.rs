//! Telegram bot delivery.
//!
//! Two bots serve the two directions of traffic: the **notify** bot alerts
//! employees about assignments, the **report** bot reports submissions to
//! the employer's private channel. [`TelegramSender`] posts `sendMessage`
//! calls with Markdown parsing; like push, delivery is single-attempt.

use std::time::Duration;

use async_trait::async_trait;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for Telegram delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Bot API returned a non-2xx status code.
    #[error("Telegram API returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Which bot a message goes out through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bot {
    /// Employer -> employee assignment alerts.
    Notify,
    /// Employee -> employer submission reports.
    Report,
}

/// Outbound Telegram channel.
#[async_trait]
pub trait TelegramGateway: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str, bot: Bot) -> Result<(), TelegramError>;
}

// ---------------------------------------------------------------------------
// Config + sender
// ---------------------------------------------------------------------------

/// Telegram bot tokens loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    /// Token of the notify bot. `None` disables employee-direction sends.
    pub notify_token: Option<String>,
    /// Token of the report bot. `None` disables employer-direction sends.
    pub report_token: Option<String>,
}

impl TelegramConfig {
    /// Load from `TELEGRAM_BOT_TOKEN_NOTIFY` / `TELEGRAM_BOT_TOKEN_REPORT`.
    /// Either may be absent; a missing token disables that bot only.
    pub fn from_env() -> Self {
        Self {
            notify_token: std::env::var("TELEGRAM_BOT_TOKEN_NOTIFY").ok(),
            report_token: std::env::var("TELEGRAM_BOT_TOKEN_REPORT").ok(),
        }
    }
}

/// Delivers messages through the Telegram Bot API.
pub struct TelegramSender {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramSender {
    /// Create a sender with a pre-configured HTTP client.
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        if config.notify_token.is_none() {
            tracing::warn!("TELEGRAM_BOT_TOKEN_NOTIFY not set, notify bot disabled");
        }
        if config.report_token.is_none() {
            tracing::warn!("TELEGRAM_BOT_TOKEN_REPORT not set, report bot disabled");
        }
        Self { client, config }
    }

    fn token_for(&self, bot: Bot) -> Option<&str> {
        match bot {
            Bot::Notify => self.config.notify_token.as_deref(),
            Bot::Report => self.config.report_token.as_deref(),
        }
    }
}

#[async_trait]
impl TelegramGateway for TelegramSender {
    /// Post a `sendMessage` call. A no-op when the selected bot has no
    /// token configured.
    async fn send(&self, chat_id: &str, text: &str, bot: Bot) -> Result<(), TelegramError> {
        let Some(token) = self.token_for(bot) else {
            return Ok(());
        };

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(TelegramError::HttpStatus(response.status().as_u16()));
        }
        tracing::debug!(chat_id, ?bot, "Telegram message delivered");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_sender_does_not_panic() {
        let _sender = TelegramSender::new(TelegramConfig::default());
    }

    #[tokio::test]
    async fn send_without_token_is_a_silent_noop() {
        let sender = TelegramSender::new(TelegramConfig::default());
        assert!(sender.send("123", "hello", Bot::Notify).await.is_ok());
        assert!(sender.send("123", "hello", Bot::Report).await.is_ok());
    }

    #[test]
    fn bots_resolve_their_own_tokens() {
        let sender = TelegramSender::new(TelegramConfig {
            notify_token: Some("aaa".into()),
            report_token: None,
        });
        assert_eq!(sender.token_for(Bot::Notify), Some("aaa"));
        assert_eq!(sender.token_for(Bot::Report), None);
    }

    #[test]
    fn telegram_error_display_http_status() {
        let err = TelegramError::HttpStatus(429);
        assert_eq!(err.to_string(), "Telegram API returned HTTP 429");
    }
}
