//! Client side of the chat widget: keeps the message history and talks to
//! the relay endpoint.

use std::time::Duration;

use crate::errors::AppError;
use crate::models::{ChatMessage, RelayRequest, RelayResponse};

pub const NO_RESPONSE_TEXT: &str = "No response from the chatbot.";
pub const SEND_FAILED_TEXT: &str = "Error: Unable to send the message.";
pub const SEND_FAILED_INDICATOR: &str = "Unable to send the message.";

/// HTTP client for `POST /api/chatbot-webhook`.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    relay_url: String,
}

impl RelayClient {
    pub fn new(relay_url: impl Into<String>, timeout_secs: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create relay client: {}", e)))?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
        })
    }

    /// Sends one message; non-2xx answers become [`AppError::Upstream`] with
    /// the relay's `message` as body when it has one.
    pub async fn send(&self, message: &str) -> Result<RelayResponse, AppError> {
        let response = self
            .client
            .post(&self.relay_url)
            .json(&RelayRequest::text(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let body = body
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// One chat widget session. History is append-only and lives only as long
/// as the session.
pub struct ChatSession {
    relay: RelayClient,
    history: Vec<ChatMessage>,
    error: Option<String>,
}

impl ChatSession {
    pub fn new(relay: RelayClient) -> Self {
        Self {
            relay,
            history: Vec::new(),
            error: None,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Error indicator shown next to the history, cleared on every send.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submits user input.
    ///
    /// Whitespace-only input is ignored and returns `false`. Otherwise the
    /// user message is appended right away, the trimmed text is relayed, and
    /// exactly one system message (reply or error) follows it.
    pub async fn send(&mut self, input: &str) -> bool {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return false;
        }

        self.history.push(ChatMessage::user(input));
        self.error = None;

        match self.relay.send(trimmed).await {
            Ok(response) => {
                let text = response
                    .output()
                    .filter(|output| !output.is_empty())
                    .unwrap_or(NO_RESPONSE_TEXT);
                self.history.push(ChatMessage::system(text));
            }
            Err(e) => {
                tracing::error!("Failed to send chat message: {}", e);
                self.error = Some(SEND_FAILED_INDICATOR.to_string());
                self.history.push(ChatMessage::system(SEND_FAILED_TEXT));
            }
        }

        true
    }
}
