//! Sales appointment dashboard service.
//!
//! Reads the team's appointment sheet, keeps today's meetings grouped by
//! salesperson, and relays chat messages to an external automation webhook.
//!
//! # Modules
//!
//! - `appointments`: Header normalization, row mapping, day filter, grouping.
//! - `chat`: Client-side chat session and relay client.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `google_auth`: OAuth2 access token refresh.
//! - `handlers`: HTTP request handlers and router assembly.
//! - `ingestion`: Ingestion orchestrator and its observable state.
//! - `models`: Domain and wire models.
//! - `relay`: Outbound webhook relay.
//! - `sheets_client`: Spreadsheet provider clients.

pub mod appointments;
pub mod chat;
pub mod config;
pub mod errors;
pub mod google_auth;
pub mod handlers;
pub mod ingestion;
pub mod models;
pub mod relay;
pub mod sheets_client;
