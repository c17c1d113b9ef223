//! Handler for requests that match no route.

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// Returns the standard JSON error body with `404 Not Found`.
pub async fn fallback_handler(uri: Uri) -> AppError {
    AppError::not_found("Route not found", json!({ "path": uri.path() }))
}
