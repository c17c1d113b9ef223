//! PostgreSQL implementation of the URL record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewUrlRecord, UrlRecord, UrlSummary};
use crate::domain::repositories::{InsertOutcome, UrlRepository};
use crate::error::{AppError, map_sqlx_error};
use serde_json::json;

const CODE_CONSTRAINT: &str = "url_records_code_key";
const ORIGINAL_URL_CONSTRAINT: &str = "url_records_original_url_key";

const RECORD_COLUMNS: &str =
    "id, code, original_url, qr_image, clicks, created_at, last_accessed_at";

#[derive(FromRow)]
struct UrlRecordRow {
    id: i64,
    code: String,
    original_url: String,
    qr_image: Vec<u8>,
    clicks: i64,
    created_at: DateTime<Utc>,
    last_accessed_at: Option<DateTime<Utc>>,
}

impl From<UrlRecordRow> for UrlRecord {
    fn from(r: UrlRecordRow) -> Self {
        UrlRecord::new(
            r.id,
            r.code,
            r.original_url,
            r.qr_image,
            u64::try_from(r.clicks).unwrap_or_default(),
            r.created_at,
            r.last_accessed_at,
        )
    }
}

#[derive(FromRow)]
struct UrlSummaryRow {
    code: String,
    original_url: String,
    clicks: i64,
    created_at: DateTime<Utc>,
    last_accessed_at: Option<DateTime<Utc>>,
}

impl From<UrlSummaryRow> for UrlSummary {
    fn from(r: UrlSummaryRow) -> Self {
        UrlSummary {
            code: r.code,
            original_url: r.original_url,
            clicks: u64::try_from(r.clicks).unwrap_or_default(),
            created_at: r.created_at,
            last_accessed_at: r.last_accessed_at,
        }
    }
}

/// Which unique key an insert collided with.
enum UniqueViolation {
    Code,
    OriginalUrl,
}

fn unique_violation(e: &sqlx::Error) -> Option<UniqueViolation> {
    let db_err = e.as_database_error()?;

    if !db_err.is_unique_violation() {
        return None;
    }

    match db_err.constraint() {
        Some(CODE_CONSTRAINT) => Some(UniqueViolation::Code),
        Some(ORIGINAL_URL_CONSTRAINT) => Some(UniqueViolation::OriginalUrl),
        _ => None,
    }
}

/// PostgreSQL repository for URL records.
///
/// Uniqueness is enforced by the database: `code` has a unique constraint and
/// `original_url` a unique index on its MD5 digest. Inserts rely on those
/// constraints instead of a check-then-insert, and click counting is a single
/// `UPDATE ... RETURNING` statement.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn insert(&self, new_record: NewUrlRecord) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query_as::<_, UrlRecordRow>(&format!(
            r#"
            INSERT INTO url_records (code, original_url, qr_image)
            VALUES ($1, $2, $3)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(&new_record.code)
        .bind(&new_record.original_url)
        .bind(new_record.qr_image.as_slice())
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(row.into())),
            Err(e) => match unique_violation(&e) {
                Some(UniqueViolation::Code) => Ok(InsertOutcome::CodeTaken),
                Some(UniqueViolation::OriginalUrl) => {
                    // The conflicting row is committed by the time the violation is raised.
                    let existing = self
                        .find_by_original_url(&new_record.original_url)
                        .await?
                        .ok_or_else(|| {
                            AppError::conflict(
                                "Original URL digest collision",
                                json!({ "original_url": new_record.original_url }),
                            )
                        })?;
                    Ok(InsertOutcome::OriginalUrlTaken(existing))
                }
                None => Err(map_sqlx_error(e)),
            },
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query_as::<_, UrlRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM url_records WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(UrlRecord::from))
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query_as::<_, UrlRecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM url_records
            WHERE md5(original_url) = md5($1) AND original_url = $1
            "#
        ))
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(UrlRecord::from))
    }

    async fn record_click(
        &self,
        code: &str,
        accessed_at: DateTime<Utc>,
    ) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query_as::<_, UrlRecordRow>(&format!(
            r#"
            UPDATE url_records
            SET clicks = clicks + 1,
                last_accessed_at = GREATEST(created_at, $2)
            WHERE code = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(accessed_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(UrlRecord::from))
    }

    async fn list_summaries(&self) -> Result<Vec<UrlSummary>, AppError> {
        let rows = sqlx::query_as::<_, UrlSummaryRow>(
            r#"
            SELECT code, original_url, clicks, created_at, last_accessed_at
            FROM url_records
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(UrlSummary::from).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM url_records")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
