//! Mobile push delivery.
//!
//! [`PushSender`] posts one batched JSON message per notice to the push
//! provider: a single request carrying every active device token for the
//! recipient. Delivery is fire-and-forget -- a failed send is reported to
//! the caller for logging but never retried.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Push provider returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Outbound push channel. One call per notice, regardless of how many
/// device tokens the recipient has.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), PushError>;
}

// ---------------------------------------------------------------------------
// Config + sender
// ---------------------------------------------------------------------------

/// Push provider configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    /// Provider endpoint URL. `None` disables push delivery.
    pub endpoint: Option<String>,
    /// Server key sent as a bearer token.
    pub server_key: Option<String>,
}

impl PushConfig {
    /// Load from `PUSH_ENDPOINT` / `PUSH_SERVER_KEY`. Either may be absent;
    /// an incomplete configuration disables the channel.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("PUSH_ENDPOINT").ok(),
            server_key: std::env::var("PUSH_SERVER_KEY").ok(),
        }
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.server_key.is_some()
    }
}

/// Delivers notices to the push provider over HTTP.
pub struct PushSender {
    client: reqwest::Client,
    config: PushConfig,
}

impl PushSender {
    /// Create a sender with a pre-configured HTTP client.
    pub fn new(config: PushConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        if !config.is_configured() {
            tracing::warn!("Push provider not configured, push delivery disabled");
        }
        Self { client, config }
    }
}

#[async_trait]
impl PushGateway for PushSender {
    /// Send one batched message to every token.
    ///
    /// A no-op when the provider is unconfigured or the token list is
    /// empty -- neither is an error.
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), PushError> {
        let (Some(endpoint), Some(server_key)) =
            (self.config.endpoint.as_ref(), self.config.server_key.as_ref())
        else {
            return Ok(());
        };
        if tokens.is_empty() {
            return Ok(());
        }

        let payload = serde_json::json!({
            "registration_ids": tokens,
            "notification": { "title": title, "body": body },
            "data": data,
        });

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(server_key)
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }
        tracing::debug!(token_count = tokens.len(), "Push batch delivered");
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
        let _sender = PushSender::new(PushConfig::default());
    }

    #[tokio::test]
    async fn unconfigured_send_is_a_silent_noop() {
        let sender = PushSender::new(PushConfig::default());
        let result = sender
            .send_batch(&["tok".into()], "t", "b", &HashMap::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn empty_token_list_skips_the_request() {
        let sender = PushSender::new(PushConfig {
            endpoint: Some("http://localhost:1".into()),
            server_key: Some("k".into()),
        });
        // No tokens: must return Ok without attempting the (dead) endpoint.
        assert!(sender.send_batch(&[], "t", "b", &HashMap::new()).await.is_ok());
    }

    #[test]
    fn push_error_display_http_status() {
        let err = PushError::HttpStatus(503);
        assert_eq!(err.to_string(), "Push provider returned HTTP 503");
    }
}
