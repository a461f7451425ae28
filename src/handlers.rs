use crate::appointments::{format_appointment_date, parse_appointment_date};
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::ingestion::{AppointmentIngestor, IngestionState};
use crate::models::{RelayRequest, RelayResponse, SheetResponse};
use crate::relay::{ChatRelay, MESSAGE_REQUIRED};
use crate::sheets_client::{GoogleSheetsClient, RowSource};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request bodies above this size are refused with 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Spreadsheet provider client.
    pub sheets: GoogleSheetsClient,
    /// Outbound webhook relay.
    pub relay: ChatRelay,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        Ok(Self {
            sheets: GoogleSheetsClient::new(&config)?,
            relay: ChatRelay::new(&config)?,
            config,
        })
    }
}

/// Error wrapper for the sheet read endpoint, which answers `{ "error": ... }`.
pub struct SheetError(pub AppError);

impl From<AppError> for SheetError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SheetError {
    fn into_response(self) -> Response {
        let (status, message) = self.0.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rdv-dashboard",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/get-sheet
///
/// Returns the raw sheet rows, header row first. An empty sheet answers
/// `{ "data": null }`.
pub async fn get_sheet(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SheetResponse>, SheetError> {
    let data = state
        .sheets
        .fetch_rows()
        .await
        .with_context(|| format!("Fetching sheet {}", state.config.spreadsheet_id))?;

    Ok(Json(SheetResponse { data }))
}

/// POST /api/chatbot-webhook
///
/// Forwards `{ "message": ... }` to the automation webhook. A body that is
/// not valid JSON is treated the same as one without a message. Non-string
/// messages are relayed as their JSON text.
pub async fn chatbot_webhook(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayResponse>, AppError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected chat relay body: {}", rejection);
            return Err(AppError::Validation(MESSAGE_REQUIRED.to_string()));
        }
    };

    let message = request.message_text();
    let response = state.relay.forward(message.as_deref()).await?;
    Ok(Json(response))
}

/// Fallback for verbs a route does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[derive(Debug, Deserialize)]
pub struct AppointmentsQuery {
    /// Reference day as `DD/MM/YYYY`; defaults to the local date.
    pub date: Option<String>,
}

/// GET /api/appointments/today
///
/// Runs one ingestion cycle server-side and returns today's appointments
/// grouped by salesperson.
pub async fn todays_appointments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AppointmentsQuery>,
) -> Result<Response, AppError> {
    let day = match params.date.as_deref() {
        Some(raw) => parse_appointment_date(raw).ok_or_else(|| {
            AppError::Validation(format!("Invalid date '{}', expected DD/MM/YYYY", raw))
        })?,
        None => chrono::Local::now().date_naive(),
    };

    let ingestor = AppointmentIngestor::new(state.sheets.clone());
    let response = match ingestor.run(day).await {
        IngestionState::Success(grouped) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "date": format_appointment_date(day),
                "appointments": grouped,
            })),
        )
            .into_response(),
        IngestionState::Failure(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "failure", "message": message })),
        )
            .into_response(),
        IngestionState::Loading => {
            return Err(AppError::Internal(
                "Ingestion finished in loading state".to_string(),
            ))
        }
    };

    Ok(response)
}

/// `/api` routes, without rate limiting so callers can layer it.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/get-sheet", get(get_sheet))
        .route(
            "/api/chatbot-webhook",
            post(chatbot_webhook).fallback(method_not_allowed),
        )
        .route("/api/appointments/today", get(todays_appointments))
        .layer(
            ServiceBuilder::new()
                // Chat messages and sheet queries are small
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}

/// Assembles the full application: health check, the given API routes and
/// the tracing/CORS layers.
pub fn app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
