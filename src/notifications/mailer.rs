// ABOUTME: HTTP mail relay transport for outbound notifications
// ABOUTME: Posts rendered messages to a transactional-mail API endpoint

use super::{NotificationSender, NotifyError, OutboundMessage};
use crate::http_client::api_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::env;
use tracing::debug;

/// Configuration for the mail relay endpoint
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Relay endpoint accepting message JSON
    pub endpoint: String,
    /// Bearer token presented to the relay
    pub api_token: String,
    /// Sender address stamped on every message
    pub from_address: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8025/api/send".into(),
            api_token: String::new(),
            from_address: "somnus@localhost".into(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl MailerConfig {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::var("MAIL_RELAY_URL").unwrap_or(defaults.endpoint),
            api_token: env::var("MAIL_RELAY_TOKEN").unwrap_or_default(),
            from_address: env::var("MAIL_FROM_ADDRESS").unwrap_or(defaults.from_address),
            timeout_secs: defaults.timeout_secs,
            connect_timeout_secs: defaults.connect_timeout_secs,
        }
    }
}

/// Notification transport posting to an HTTP mail relay
pub struct HttpMailer {
    client: Client,
    config: MailerConfig,
}

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

impl HttpMailer {
    /// Create a mailer from configuration
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        let client = api_client(config.timeout_secs, config.connect_timeout_secs);
        Self { client, config }
    }
}

#[async_trait]
impl NotificationSender for HttpMailer {
    fn name(&self) -> &str {
        "http_mailer"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<u32, NotifyError> {
        let payload = RelayPayload {
            from: &self.config.from_address,
            to: &message.recipient,
            subject: &message.subject,
            text: &message.plain_body,
            html: &message.html_body,
        };

        debug!(
            "Dispatching '{}' to {} via mail relay",
            message.subject, message.recipient
        );

        let mut request = self.client.post(&self.config.endpoint).json(&payload);
        if !self.config.api_token.is_empty() {
            request = request.bearer_auth(&self.config.api_token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {body}")));
        }

        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_payload_shape() {
        let payload = RelayPayload {
            from: "somnus@localhost",
            to: "lea@example.com",
            subject: "Time for Bed!",
            text: "plain",
            html: "<html></html>",
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["from"], "somnus@localhost");
        assert_eq!(json["to"], "lea@example.com");
        assert_eq!(json["subject"], "Time for Bed!");
    }
}
