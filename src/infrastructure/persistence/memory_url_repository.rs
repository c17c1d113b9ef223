//! In-process implementation of the URL record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{NewUrlRecord, UrlRecord, UrlSummary};
use crate::domain::repositories::{InsertOutcome, UrlRepository};
use crate::error::AppError;

#[derive(Default)]
struct MemoryState {
    records: HashMap<String, UrlRecord>,
    codes_by_url: HashMap<String, String>,
    next_id: i64,
}

/// Repository keeping every record in memory behind a single `RwLock`.
///
/// Inserts and click updates take the write lock, which makes the
/// insert-if-absent check and the counter increment atomic. Lookups share the
/// read lock. Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryUrlRepository {
    state: RwLock<MemoryState>,
}

impl MemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn insert(&self, new_record: NewUrlRecord) -> Result<InsertOutcome, AppError> {
        let mut state = self.state.write().await;

        if let Some(code) = state.codes_by_url.get(&new_record.original_url) {
            let existing = state.records.get(code).cloned().ok_or_else(|| {
                AppError::internal(
                    "URL index points to a missing record",
                    serde_json::json!({ "code": code }),
                )
            })?;
            return Ok(InsertOutcome::OriginalUrlTaken(existing));
        }

        if state.records.contains_key(&new_record.code) {
            return Ok(InsertOutcome::CodeTaken);
        }

        state.next_id += 1;
        let record = UrlRecord::new(
            state.next_id,
            new_record.code.clone(),
            new_record.original_url.clone(),
            new_record.qr_image,
            0,
            Utc::now(),
            None,
        );

        state
            .codes_by_url
            .insert(new_record.original_url, new_record.code.clone());
        state.records.insert(new_record.code, record.clone());

        Ok(InsertOutcome::Inserted(record))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, AppError> {
        Ok(self.state.read().await.records.get(code).cloned())
    }

    async fn find_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        let state = self.state.read().await;

        Ok(state
            .codes_by_url
            .get(original_url)
            .and_then(|code| state.records.get(code))
            .cloned())
    }

    async fn record_click(
        &self,
        code: &str,
        accessed_at: DateTime<Utc>,
    ) -> Result<Option<UrlRecord>, AppError> {
        let mut state = self.state.write().await;

        Ok(state.records.get_mut(code).map(|record| {
            record.clicks += 1;
            record.last_accessed_at = Some(accessed_at.max(record.created_at));
            record.clone()
        }))
    }

    async fn list_summaries(&self) -> Result<Vec<UrlSummary>, AppError> {
        let state = self.state.read().await;

        let mut records: Vec<&UrlRecord> = state.records.values().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(records.into_iter().map(UrlRecord::summary).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.state.read().await.records.len() as i64)
    }
}
