//! Handler for per-link statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::url_record::UrlRecordResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the current state of a short link without counting a click.
///
/// # Endpoint
///
/// `GET /api/stats/{code}`
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlRecordResponse>, AppError> {
    let record = state.url_service.get_stats(&code).await?;
    let short_url = state.url_service.short_url(&record.code);

    Ok(Json(UrlRecordResponse::new(&record, short_url)))
}
