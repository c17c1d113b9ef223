//! Wire representation of a stored short link.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::UrlRecord;

/// Full record as returned by shorten and stats endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecordResponse {
    pub code: String,
    pub original_url: String,
    pub short_url: String,
    /// `data:image/png;base64,...` URL of the QR image.
    pub qr_code: String,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl UrlRecordResponse {
    pub fn new(record: &UrlRecord, short_url: String) -> Self {
        Self {
            code: record.code.clone(),
            original_url: record.original_url.clone(),
            short_url,
            qr_code: record.qr_data_url(),
            clicks: record.clicks,
            created_at: record.created_at,
            last_accessed_at: record.last_accessed_at,
        }
    }
}
