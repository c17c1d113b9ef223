//! DTOs for the link history endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::UrlSummary;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub total: usize,
    pub items: Vec<HistoryItem>,
}

/// One entry of the history listing, without the QR payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub code: String,
    pub original_url: String,
    pub short_url: String,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl HistoryItem {
    pub fn new(summary: UrlSummary, short_url: String) -> Self {
        Self {
            code: summary.code,
            original_url: summary.original_url,
            short_url,
            clicks: summary.clicks,
            created_at: summary.created_at,
            last_accessed_at: summary.last_accessed_at,
        }
    }
}
