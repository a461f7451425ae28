use chrono::NaiveDate;
use tokio::sync::watch;

use crate::appointments::build_daily_grouping;
use crate::models::GroupedAppointments;
use crate::sheets_client::RowSource;

/// Shown to dashboard users whenever the sheet cannot be loaded.
pub const LOAD_FAILURE_MESSAGE: &str = "Unable to load appointments.";

/// Observable outcome of one ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionState {
    Loading,
    Success(GroupedAppointments),
    Failure(String),
}

impl IngestionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, IngestionState::Loading)
    }
}

/// Runs fetch -> map -> filter -> group over a [`RowSource`].
///
/// Each call to [`run`](Self::run) is one full cycle; the grouping is
/// replaced wholesale, never patched. Failures end the cycle in
/// [`IngestionState::Failure`] and are never retried.
pub struct AppointmentIngestor<S> {
    source: S,
    state: watch::Sender<IngestionState>,
}

impl<S: RowSource> AppointmentIngestor<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(IngestionState::Loading);
        Self { source, state }
    }

    /// Current state.
    pub fn state(&self) -> IngestionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<IngestionState> {
        self.state.subscribe()
    }

    /// Runs one ingestion cycle for `today` and returns the terminal state.
    pub async fn run(&self, today: NaiveDate) -> IngestionState {
        self.state.send_replace(IngestionState::Loading);

        let next = match self.source.fetch_rows().await {
            Err(e) => {
                tracing::error!("Failed to fetch appointments: {}", e);
                IngestionState::Failure(LOAD_FAILURE_MESSAGE.to_string())
            }
            Ok(None) => IngestionState::Success(GroupedAppointments::new()),
            Ok(Some(data)) if data.is_empty() => {
                IngestionState::Success(GroupedAppointments::new())
            }
            Ok(Some(data)) => {
                let grouped = build_daily_grouping(&data, today);
                tracing::info!(
                    "Loaded {} appointment(s) for {} salesperson(s)",
                    grouped.total(),
                    grouped.len()
                );
                IngestionState::Success(grouped)
            }
        };

        self.state.send_replace(next.clone());
        next
    }
}
