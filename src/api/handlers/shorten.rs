//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::dto::url_record::UrlRecordResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL, reusing the existing short link if the URL was seen before.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "originalUrl": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// `201 Created` for a new link, `200 OK` when the URL already existed:
///
/// ```json
/// {
///   "created": true,
///   "message": "URL shortened successfully",
///   "data": {
///     "code": "Xy3_a9Qz",
///     "originalUrl": "https://example.com/some/long/path",
///     "shortUrl": "http://localhost:3000/Xy3_a9Qz",
///     "qrCode": "data:image/png;base64,...",
///     "clicks": 0,
///     "createdAt": "2025-01-01T12:00:00Z",
///     "lastAccessedAt": null
///   }
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the body is not valid JSON with an
/// `originalUrl` field, or the URL is not a valid absolute http(s) URL.
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let creation = state
        .url_service
        .create_or_get(&payload.original_url)
        .await?;

    let (status, message) = if creation.is_created() {
        (StatusCode::CREATED, "URL shortened successfully")
    } else {
        (StatusCode::OK, "URL already exists")
    };

    let data = UrlRecordResponse::new(&creation, state.url_service.short_url(&creation.code));

    Ok((
        status,
        Json(ShortenResponse {
            created: creation.is_created(),
            message,
            data,
        }),
    ))
}
