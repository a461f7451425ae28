use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Network, HTTP or decoding failure talking to an external service.
    Transport(String),
    /// Missing or invalid request field.
    Validation(String),
    /// Request used a verb the route does not serve.
    MethodNotAllowed,
    /// A required external address or credential is absent.
    Configuration(String),
    /// External service answered with a failure status.
    Upstream {
        /// Status returned by the external service.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// Internal server error.
    Internal(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Upstream { status, body } => {
                write!(f, "Upstream returned {}: {}", status, body)
            }
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Maps the error to the status and caller-facing message.
    ///
    /// Variants whose detail is operator-only are logged here and replaced by a
    /// fixed message.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Transport(msg) => {
                tracing::error!("Transport error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
            ),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Upstream { status, body } => {
                tracing::error!("Upstream error {}: {}", status, body);
                let status =
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, body.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                source.status_and_message()
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Renders `{ "message": ... }` with the mapped status.
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
