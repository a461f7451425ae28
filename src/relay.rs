use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{RelayResponse, WebhookRequest};

pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const WEBHOOK_NOT_CONFIGURED: &str = "Webhook URL not configured";
pub const RELAY_SUCCESS: &str = "Message sent to webhook";

/// Forwards chat messages to the external automation webhook.
#[derive(Clone)]
pub struct ChatRelay {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl ChatRelay {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create webhook client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Validates the message, posts `{ "text": message }` to the webhook and
    /// wraps its parsed JSON reply.
    ///
    /// A webhook failure comes back as [`AppError::Upstream`] carrying the
    /// webhook's own status and body.
    pub async fn forward(&self, message: Option<&str>) -> Result<RelayResponse, AppError> {
        let message = message
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation(MESSAGE_REQUIRED.to_string()))?;

        let Some(ref webhook_url) = self.webhook_url else {
            tracing::error!("N8N_CHATBOT_WEBHOOK_URL is not defined in environment variables");
            return Err(AppError::Configuration(WEBHOOK_NOT_CONFIGURED.to_string()));
        };

        tracing::info!("Relaying chat message ({} chars)", message.chars().count());

        let response = self
            .client
            .post(webhook_url)
            .json(&WebhookRequest { text: message })
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Webhook returned error {}: {}", status, body);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let n8n_response: Value = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to parse webhook response: {}", e)))?;

        tracing::debug!("Webhook replied: {}", n8n_response);
        Ok(RelayResponse {
            message: RELAY_SUCCESS.to_string(),
            n8n_response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpreadsheetCredentials;

    fn relay(webhook_url: Option<&str>) -> ChatRelay {
        let config = Config {
            port: 3000,
            webhook_url: webhook_url.map(str::to_string),
            spreadsheet_id: "sheet".to_string(),
            range: "RDV!A1:J1000".to_string(),
            spreadsheet_credentials: SpreadsheetCredentials::ApiKey("key".to_string()),
            sheets_api_base_url: "https://sheets.googleapis.com".to_string(),
            http_timeout_secs: 5,
        };
        ChatRelay::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_missing_message_checked_before_configuration() {
        let err = relay(None).forward(None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == MESSAGE_REQUIRED));

        let err = relay(None).forward(Some("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_webhook() {
        let relay = relay(None);
        assert!(!relay.is_configured());
        let err = relay.forward(Some("hi")).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(ref m) if m == WEBHOOK_NOT_CONFIGURED));
    }
}
