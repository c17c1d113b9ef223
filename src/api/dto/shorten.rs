//! DTOs for link shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::url_record::UrlRecordResponse;

/// Request to shorten a URL.
///
/// Unknown fields are ignored.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    /// The original URL to shorten (must be a valid absolute URL).
    #[validate(url(message = "Invalid URL format. Please provide a valid URL."))]
    pub original_url: String,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    /// `false` when the URL had already been shortened.
    pub created: bool,
    pub message: &'static str,
    pub data: UrlRecordResponse,
}
