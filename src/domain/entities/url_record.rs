//! URL record entity: the mapping between a short code and an original URL.

use base64::Engine as _;
use chrono::{DateTime, Utc};

/// A stored short link with its QR artifact and usage metadata.
///
/// Records are created once and afterwards only change through resolution,
/// which bumps `clicks` and `last_accessed_at`. Callers always hold owned
/// snapshots; the repository remains the single writer.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRecord {
    pub id: i64,
    pub code: String,
    pub original_url: String,
    /// PNG encoding of the record's short URL.
    pub qr_image: Vec<u8>,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl UrlRecord {
    /// Creates a new UrlRecord instance.
    pub fn new(
        id: i64,
        code: String,
        original_url: String,
        qr_image: Vec<u8>,
        clicks: u64,
        created_at: DateTime<Utc>,
        last_accessed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            code,
            original_url,
            qr_image,
            clicks,
            created_at,
            last_accessed_at,
        }
    }

    /// Returns the QR image as a `data:` URL suitable for an `<img src>`.
    pub fn qr_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.qr_image)
        )
    }

    /// Listing projection without the QR payload.
    pub fn summary(&self) -> UrlSummary {
        UrlSummary {
            code: self.code.clone(),
            original_url: self.original_url.clone(),
            clicks: self.clicks,
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
        }
    }
}

/// Lightweight view of a record used by history listings.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlSummary {
    pub code: String,
    pub original_url: String,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// Input data for inserting a new record.
///
/// The QR image is rendered before insertion so a record never becomes
/// visible without it.
#[derive(Debug, Clone)]
pub struct NewUrlRecord {
    pub code: String,
    pub original_url: String,
    pub qr_image: Vec<u8>,
}
