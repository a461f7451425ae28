use async_trait::async_trait;
use std::time::Duration;

use crate::config::{Config, SpreadsheetCredentials};
use crate::errors::AppError;
use crate::google_auth::TokenRefresher;
use crate::models::{SheetResponse, ValueRange};

/// Anything that can hand back the raw appointment sheet.
///
/// `Ok(None)` means the provider answered but had no rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Option<Vec<Vec<String>>>, AppError>;
}

fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

#[derive(Clone)]
enum SheetAuth {
    Refreshing(TokenRefresher),
    Bearer(String),
    ApiKey(String),
}

/// Read-only client for the Google Sheets v4 `values.get` API.
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    auth: SheetAuth,
}

impl GoogleSheetsClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config.http_timeout_secs)?;
        let auth = match &config.spreadsheet_credentials {
            SpreadsheetCredentials::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => SheetAuth::Refreshing(TokenRefresher::new(
                client.clone(),
                client_id.as_str(),
                client_secret.clone(),
                refresh_token.as_str(),
                token_uri.as_str(),
            )),
            SpreadsheetCredentials::AccessToken(token) => SheetAuth::Bearer(token.clone()),
            SpreadsheetCredentials::ApiKey(key) => SheetAuth::ApiKey(key.clone()),
        };

        Ok(Self {
            client,
            base_url: config.sheets_api_base_url.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            range: config.range.clone(),
            auth,
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}`, each segment
    /// percent-encoded since sheet names may contain spaces.
    fn values_url(&self) -> Result<url::Url, AppError> {
        let mut url = url::Url::parse(&self.base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid Sheets API base URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration("Sheets API base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);
        Ok(url)
    }
}

#[async_trait]
impl RowSource for GoogleSheetsClient {
    async fn fetch_rows(&self) -> Result<Option<Vec<Vec<String>>>, AppError> {
        let url = self.values_url()?;
        tracing::info!(
            "Fetching sheet {} range {}",
            self.spreadsheet_id,
            self.range
        );

        let request = self.client.get(url);
        let request = match &self.auth {
            SheetAuth::Refreshing(refresher) => {
                request.bearer_auth(refresher.access_token().await?)
            }
            SheetAuth::Bearer(token) => request.bearer_auth(token),
            SheetAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Sheets request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = error_body(response).await;
            tracing::error!("Sheets API returned error {}: {}", status, body);
            if let SheetAuth::Refreshing(refresher) = &self.auth {
                if status == reqwest::StatusCode::UNAUTHORIZED {
                    // Revoked before its stated expiry
                    refresher.invalidate().await;
                }
            }
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let value_range: ValueRange = response.json().await.map_err(|e| {
            AppError::Transport(format!("Failed to parse Sheets response: {}", e))
        })?;

        tracing::debug!(
            "Sheets returned {} row(s) for {}",
            value_range.values.as_ref().map_or(0, Vec::len),
            value_range.range.as_deref().unwrap_or(&self.range)
        );
        Ok(value_range.values)
    }
}

/// Client for the dashboard's own sheet read endpoint (`GET /api/get-sheet`).
#[derive(Clone)]
pub struct SheetEndpointClient {
    client: reqwest::Client,
    endpoint_url: String,
}

impl SheetEndpointClient {
    pub fn new(endpoint_url: impl Into<String>, timeout_secs: u64) -> Result<Self, AppError> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            endpoint_url: endpoint_url.into(),
        })
    }
}

#[async_trait]
impl RowSource for SheetEndpointClient {
    async fn fetch_rows(&self) -> Result<Option<Vec<Vec<String>>>, AppError> {
        let response = self
            .client
            .get(&self.endpoint_url)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Sheet endpoint request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = error_body(response).await;
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let sheet: SheetResponse = response.json().await.map_err(|e| {
            AppError::Transport(format!("Failed to parse sheet endpoint response: {}", e))
        })?;
        Ok(sheet.data)
    }
}
