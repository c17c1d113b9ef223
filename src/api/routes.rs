//! API route configuration.
//!
//! Mounted under `/api` by [`crate::routes::app_router`], which also applies
//! the per-IP rate limit.

use crate::api::handlers::{history_handler, qr_handler, shorten_handler, stats_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST /shorten`       - Shorten a URL (or return the existing short link)
/// - `GET  /history`       - Every short link, newest first
/// - `GET  /stats/{code}`  - Current record for a code, without counting a click
/// - `GET  /qr/{code}`     - QR image of the short URL as PNG
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/history", get(history_handler))
        .route("/stats/{code}", get(stats_handler))
        .route("/qr/{code}", get(qr_handler))
}
