//! Handler for the link history listing.

use axum::{Json, extract::State};

use crate::api::dto::history::{HistoryItem, HistoryResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Lists every short link, newest first.
///
/// # Endpoint
///
/// `GET /api/history`
///
/// # Response
///
/// ```json
/// {
///   "total": 1,
///   "items": [
///     {
///       "code": "Xy3_a9Qz",
///       "originalUrl": "https://example.com",
///       "shortUrl": "http://localhost:3000/Xy3_a9Qz",
///       "clicks": 2,
///       "createdAt": "2025-01-01T12:00:00Z",
///       "lastAccessedAt": "2025-01-02T08:30:00Z"
///     }
///   ]
/// }
/// ```
pub async fn history_handler(
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let summaries = state.url_service.list_all().await?;

    let items: Vec<HistoryItem> = summaries
        .into_iter()
        .map(|summary| {
            let short_url = state.url_service.short_url(&summary.code);
            HistoryItem::new(summary, short_url)
        })
        .collect();

    Ok(Json(HistoryResponse {
        total: items.len(),
        items,
    }))
}
