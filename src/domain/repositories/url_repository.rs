//! Repository trait for URL record storage.

use crate::domain::entities::{NewUrlRecord, UrlRecord, UrlSummary};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of an insert-if-absent attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The record was stored.
    Inserted(UrlRecord),
    /// Another record already uses the generated code; nothing was written.
    CodeTaken,
    /// A record for the same original URL already exists; nothing was written.
    OriginalUrlTaken(UrlRecord),
}

/// Repository interface for URL records.
///
/// Implementations must make [`UrlRepository::insert`] atomic with respect to
/// both unique keys (`code` and `original_url`) and
/// [`UrlRepository::record_click`] a single storage-level read-modify-write,
/// so concurrent callers never create duplicates or lose increments.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a record unless its code or original URL is already present.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] if the backend cannot be reached
    /// and [`AppError::Internal`] on other storage errors.
    async fn insert(&self, new_record: NewUrlRecord) -> Result<InsertOutcome, AppError>;

    /// Point lookup by short code.
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, AppError>;

    /// Point lookup by original URL (exact match).
    async fn find_by_original_url(&self, original_url: &str)
    -> Result<Option<UrlRecord>, AppError>;

    /// Atomically increments `clicks` and sets `last_accessed_at`.
    ///
    /// `last_accessed_at` is clamped so it is never earlier than `created_at`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UrlRecord))` with the post-increment state
    /// - `Ok(None)` if no record has this code (nothing is modified)
    async fn record_click(
        &self,
        code: &str,
        accessed_at: DateTime<Utc>,
    ) -> Result<Option<UrlRecord>, AppError>;

    /// Lists every record, newest first (ties broken by insertion order).
    async fn list_summaries(&self) -> Result<Vec<UrlSummary>, AppError>;

    /// Counts stored records.
    async fn count(&self) -> Result<i64, AppError>;
}
