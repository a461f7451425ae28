use crate::google_auth::DEFAULT_TOKEN_URI;

pub const DEFAULT_SHEET_RANGE: &str = "RDV!A1:J1000";
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";

/// Credential material for the spreadsheet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetCredentials {
    /// OAuth2 refresh token, exchanged for access tokens as they expire.
    RefreshToken {
        client_id: String,
        client_secret: Option<String>,
        refresh_token: String,
        token_uri: String,
    },
    /// Fixed OAuth2 bearer token minted elsewhere. Not renewed.
    AccessToken(String),
    /// Plain API key, only valid for link-shared sheets.
    ApiKey(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Absent is not a startup error: the relay answers 500 until it is set.
    pub webhook_url: Option<String>,
    pub spreadsheet_id: String,
    pub range: String,
    pub spreadsheet_credentials: SpreadsheetCredentials,
    pub sheets_api_base_url: String,
    pub http_timeout_secs: u64,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn validate_http_url(name: &str, url: String) -> anyhow::Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url)
}

fn spreadsheet_credentials_from_env() -> anyhow::Result<SpreadsheetCredentials> {
    if let Some(refresh_token) = non_empty_var("GOOGLE_OAUTH_REFRESH_TOKEN") {
        let client_id = non_empty_var("GOOGLE_OAUTH_CLIENT_ID").ok_or_else(|| {
            anyhow::anyhow!("GOOGLE_OAUTH_CLIENT_ID is required with GOOGLE_OAUTH_REFRESH_TOKEN")
        })?;
        let token_uri = validate_http_url(
            "GOOGLE_OAUTH_TOKEN_URI",
            non_empty_var("GOOGLE_OAUTH_TOKEN_URI")
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        )?;
        return Ok(SpreadsheetCredentials::RefreshToken {
            client_id,
            client_secret: non_empty_var("GOOGLE_OAUTH_CLIENT_SECRET"),
            refresh_token,
            token_uri,
        });
    }

    match (
        non_empty_var("GOOGLE_SHEETS_ACCESS_TOKEN"),
        non_empty_var("GOOGLE_SHEETS_API_KEY"),
    ) {
        (Some(token), _) => {
            tracing::warn!(
                "GOOGLE_SHEETS_ACCESS_TOKEN is not renewed; prefer GOOGLE_OAUTH_REFRESH_TOKEN"
            );
            Ok(SpreadsheetCredentials::AccessToken(token))
        }
        (None, Some(key)) => Ok(SpreadsheetCredentials::ApiKey(key)),
        (None, None) => anyhow::bail!(
            "GOOGLE_OAUTH_REFRESH_TOKEN, GOOGLE_SHEETS_ACCESS_TOKEN or GOOGLE_SHEETS_API_KEY \
             environment variable required"
        ),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let spreadsheet_credentials = spreadsheet_credentials_from_env()?;

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            webhook_url: non_empty_var("N8N_CHATBOT_WEBHOOK_URL")
                .map(|url| validate_http_url("N8N_CHATBOT_WEBHOOK_URL", url))
                .transpose()?,
            spreadsheet_id: non_empty_var("SPREADSHEET_ID")
                .ok_or_else(|| anyhow::anyhow!("SPREADSHEET_ID environment variable required"))?,
            range: non_empty_var("SHEET_RANGE").unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
            spreadsheet_credentials,
            sheets_api_base_url: validate_http_url(
                "SHEETS_API_BASE_URL",
                non_empty_var("SHEETS_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE_URL.to_string()),
            )?,
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive integer"))?,
        };

        // Never log credential material
        tracing::debug!("Spreadsheet: {} ({})", config.spreadsheet_id, config.range);
        tracing::debug!("Sheets API base URL: {}", config.sheets_api_base_url);
        match config.webhook_url {
            Some(ref url) => tracing::info!("Chatbot webhook configured: {}", url),
            None => tracing::warn!(
                "N8N_CHATBOT_WEBHOOK_URL is not set; chat relay will answer 500"
            ),
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
