pub mod accounts;
pub mod activities;
pub mod analytics;
pub mod auth;
pub mod automations;
pub mod categories;
pub mod library;
pub mod media;
pub mod middleware;
pub mod posts;
pub mod users;

use axum::http::StatusCode;
use tracing::error;

/// Storage failures are logged server-side and surface as a bare 500;
/// the message never leaks to the client.
pub(crate) fn internal_error(e: anyhow::Error) -> StatusCode {
    error!("storage error: {e:#}");
    StatusCode::INTERNAL_SERVER_ERROR
}
