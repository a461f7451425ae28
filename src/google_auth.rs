//! OAuth2 refresh-token flow for the spreadsheet provider.
//!
//! Access tokens are short-lived. The refresher keeps the last one in memory
//! and trades the long-lived refresh token for a new one when it is within a
//! minute of expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::errors::AppError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const EXPIRY_MARGIN_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// An access token together with the moment it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// True once the token is within the refresh margin of its expiry.
pub fn is_token_expired(token: &CachedToken, now: DateTime<Utc>) -> bool {
    token.expires_at <= now + Duration::seconds(EXPIRY_MARGIN_SECS)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Refresh-token credential plus the in-memory token it last obtained.
///
/// Clones share the cached token.
#[derive(Clone)]
pub struct TokenRefresher {
    client: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    refresh_token: String,
    token_uri: String,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenRefresher {
    pub fn new(
        client: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        refresh_token: impl Into<String>,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            client_secret,
            refresh_token: refresh_token.into(),
            token_uri: token_uri.into(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns a usable access token, refreshing it first when needed.
    ///
    /// The lock is held across the refresh so concurrent callers wait for a
    /// single token request.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !is_token_expired(token, Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.refresh().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Drops the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn refresh(&self) -> Result<CachedToken, AppError> {
        tracing::info!("Refreshing spreadsheet access token");

        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self
            .client
            .post(&self.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Token refresh failed with {}: {}",
                status, body
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            AppError::Transport(format!("Failed to parse token response: {}", e))
        })?;
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Transport("No access_token in token response".into()))?;
        let expires_in = body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        tracing::debug!("Spreadsheet access token valid for {}s", expires_in);
        Ok(CachedToken {
            access_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        })
    }
}
