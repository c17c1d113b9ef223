//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Every successful redirect counts as one click and updates the record's
/// last-access time before the response is sent.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let record = state.url_service.resolve(&code).await?;

    tracing::debug!(code = %record.code, clicks = record.clicks, "Redirecting");

    Ok(Redirect::temporary(&record.original_url))
}
