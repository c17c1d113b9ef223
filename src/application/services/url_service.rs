//! Short link creation, resolution and reporting.

use std::ops::Deref;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use url::Url;

use crate::domain::entities::{NewUrlRecord, UrlRecord, UrlSummary};
use crate::domain::qr::QrRenderer;
use crate::domain::repositories::{InsertOutcome, UrlRepository};
use crate::error::AppError;
use crate::utils::code_generator::{CodeGenerator, is_well_formed_code};

/// Number of codes tried before giving up with [`AppError::CodeSpaceExhausted`].
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Result of [`UrlService::create_or_get`].
#[derive(Debug, Clone, PartialEq)]
pub enum Creation {
    /// A new record was stored by this call.
    Created(UrlRecord),
    /// The URL was already shortened; the stored record is returned unchanged.
    Existing(UrlRecord),
}

impl Creation {
    pub fn is_created(&self) -> bool {
        matches!(self, Creation::Created(_))
    }

    pub fn into_record(self) -> UrlRecord {
        match self {
            Creation::Created(record) | Creation::Existing(record) => record,
        }
    }
}

impl Deref for Creation {
    type Target = UrlRecord;

    fn deref(&self) -> &UrlRecord {
        match self {
            Creation::Created(record) | Creation::Existing(record) => record,
        }
    }
}

/// The mapping store: sole owner and mutator of URL records.
///
/// Creation is deduplicated by original URL. The existence check is an
/// optimisation for the common case; the authoritative guard is the
/// repository's atomic insert-if-absent, so concurrent creators of the same URL
/// all converge on one record. Code collisions are retried with fresh codes up
/// to [`MAX_CODE_ATTEMPTS`] times.
pub struct UrlService {
    repository: Arc<dyn UrlRepository>,
    generator: Arc<dyn CodeGenerator>,
    renderer: Arc<dyn QrRenderer>,
    base_url: String,
}

impl UrlService {
    /// Creates a new URL service.
    ///
    /// `base_url` is the public address short codes are appended to; a
    /// trailing slash is ignored.
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        generator: Arc<dyn CodeGenerator>,
        renderer: Arc<dyn QrRenderer>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            repository,
            generator,
            renderer,
            base_url,
        }
    }

    /// Returns the record for `original_url`, creating it if needed.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the URL is not an absolute http(s) URL;
    ///   nothing is written in that case
    /// - [`AppError::CodeSpaceExhausted`] if every generated code collided
    /// - [`AppError::StorageUnavailable`] / [`AppError::Internal`] from storage,
    ///   the code generator or the QR renderer
    pub async fn create_or_get(&self, original_url: &str) -> Result<Creation, AppError> {
        validate_original_url(original_url)?;

        if let Some(existing) = self
            .repository
            .find_by_original_url(original_url)
            .await?
        {
            tracing::debug!(code = %existing.code, "URL already shortened");
            return Ok(Creation::Existing(existing));
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = self.generator.generate()?;
            let qr_image = self.renderer.render(&self.short_url(&code))?;

            let new_record = NewUrlRecord {
                code,
                original_url: original_url.to_string(),
                qr_image,
            };

            match self.repository.insert(new_record).await? {
                InsertOutcome::Inserted(record) => {
                    metrics::counter!("qrlink_links_created_total").increment(1);
                    tracing::info!(code = %record.code, "Short link created");
                    return Ok(Creation::Created(record));
                }
                InsertOutcome::OriginalUrlTaken(existing) => {
                    tracing::debug!(code = %existing.code, "Lost creation race, reusing record");
                    return Ok(Creation::Existing(existing));
                }
                InsertOutcome::CodeTaken => {
                    metrics::counter!("qrlink_code_collisions_total").increment(1);
                    tracing::warn!(attempt, "Short code collision, retrying");
                }
            }
        }

        tracing::error!(
            attempts = MAX_CODE_ATTEMPTS,
            "Exhausted short code attempts"
        );
        Err(AppError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Resolves a code, counting the access.
    ///
    /// The click counter and last-access time are updated by one atomic
    /// repository call; the returned record reflects this access.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this code.
    pub async fn resolve(&self, code: &str) -> Result<UrlRecord, AppError> {
        if !is_well_formed_code(code) {
            return Err(not_found(code));
        }

        let record = self
            .repository
            .record_click(code, Utc::now())
            .await?
            .ok_or_else(|| not_found(code))?;

        metrics::counter!("qrlink_redirects_total").increment(1);
        Ok(record)
    }

    /// Returns the current record without counting an access.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this code.
    pub async fn get_stats(&self, code: &str) -> Result<UrlRecord, AppError> {
        if !is_well_formed_code(code) {
            return Err(not_found(code));
        }

        self.repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| not_found(code))
    }

    /// Lists every record, most recently created first.
    pub async fn list_all(&self) -> Result<Vec<UrlSummary>, AppError> {
        self.repository.list_summaries().await
    }

    /// Counts stored records.
    pub async fn count(&self) -> Result<i64, AppError> {
        self.repository.count().await
    }

    /// Constructs the public short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}

/// Rejects anything that is not an absolute `http`/`https` URL with a host.
///
/// The URL parser silently drops tabs, newlines and surrounding whitespace,
/// but the raw string is what gets stored and later sent as `Location`, so
/// such input is refused up front.
fn validate_original_url(original_url: &str) -> Result<(), AppError> {
    let invalid = |reason: String| {
        AppError::bad_request(
            "Invalid URL format. Please provide a valid URL.",
            json!({ "url": original_url, "reason": reason }),
        )
    };

    if original_url.chars().any(|c| c.is_ascii_control()) {
        return Err(invalid("contains control characters".to_string()));
    }

    if original_url.trim() != original_url {
        return Err(invalid("leading or trailing whitespace".to_string()));
    }

    let parsed = Url::parse(original_url).map_err(|e| invalid(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::qr::MockQrRenderer;
    use crate::domain::repositories::MockUrlRepository;
    use crate::utils::code_generator::MockCodeGenerator;

    fn record(id: i64, code: &str, url: &str, clicks: u64) -> UrlRecord {
        UrlRecord::new(
            id,
            code.to_string(),
            url.to_string(),
            vec![1, 2, 3],
            clicks,
            Utc::now(),
            None,
        )
    }

    fn inserted(new_record: NewUrlRecord) -> UrlRecord {
        UrlRecord::new(
            1,
            new_record.code,
            new_record.original_url,
            new_record.qr_image,
            0,
            Utc::now(),
            None,
        )
    }

    fn fixed_generator(code: &'static str) -> MockCodeGenerator {
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .returning(move || Ok(code.to_string()));
        generator
    }

    fn echo_renderer() -> MockQrRenderer {
        let mut renderer = MockQrRenderer::new();
        renderer
            .expect_render()
            .returning(|text| Ok(text.as_bytes().to_vec()));
        renderer
    }

    fn service(
        repository: MockUrlRepository,
        generator: MockCodeGenerator,
        renderer: MockQrRenderer,
    ) -> UrlService {
        UrlService::new(
            Arc::new(repository),
            Arc::new(generator),
            Arc::new(renderer),
            "http://localhost:3000/",
        )
    }

    #[tokio::test]
    async fn test_create_new_record() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_original_url()
            .withf(|url| url == "https://example.com/a")
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_insert()
            .withf(|new| new.code == "Ab3dK9pQ" && new.original_url == "https://example.com/a")
            .times(1)
            .returning(|new| Ok(InsertOutcome::Inserted(inserted(new))));

        let service = service(repo, fixed_generator("Ab3dK9pQ"), echo_renderer());

        let creation = service.create_or_get("https://example.com/a").await.unwrap();

        assert!(creation.is_created());
        assert_eq!(creation.code, "Ab3dK9pQ");
        assert_eq!(creation.clicks, 0);
        // QR is rendered from the short URL, not the original one.
        assert_eq!(creation.qr_image, b"http://localhost:3000/Ab3dK9pQ".to_vec());
    }

    #[tokio::test]
    async fn test_create_returns_existing_without_insert() {
        let mut repo = MockUrlRepository::new();
        let existing = record(7, "existing", "https://example.com/a", 42);
        repo.expect_find_by_original_url()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_insert().times(0);

        let mut generator = MockCodeGenerator::new();
        generator.expect_generate().times(0);
        let mut renderer = MockQrRenderer::new();
        renderer.expect_render().times(0);

        let service = service(repo, generator, renderer);

        let creation = service.create_or_get("https://example.com/a").await.unwrap();

        assert!(!creation.is_created());
        assert_eq!(creation.code, "existing");
        assert_eq!(creation.clicks, 42);
    }

    #[tokio::test]
    async fn test_create_converges_when_losing_race() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_original_url()
            .times(1)
            .returning(|_| Ok(None));
        let winner = record(3, "winner00", "https://example.com/a", 0);
        repo.expect_insert()
            .times(1)
            .returning(move |_| Ok(InsertOutcome::OriginalUrlTaken(winner.clone())));

        let service = service(repo, fixed_generator("loser000"), echo_renderer());

        let creation = service.create_or_get("https://example.com/a").await.unwrap();

        assert!(!creation.is_created());
        assert_eq!(creation.code, "winner00");
    }

    #[tokio::test]
    async fn test_create_retries_on_code_collision() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_original_url()
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_insert().times(2).returning(|new| {
            if new.code == "taken000" {
                Ok(InsertOutcome::CodeTaken)
            } else {
                Ok(InsertOutcome::Inserted(inserted(new)))
            }
        });

        let mut generator = MockCodeGenerator::new();
        let mut calls = 0;
        generator.expect_generate().times(2).returning(move || {
            calls += 1;
            Ok(if calls == 1 { "taken000" } else { "fresh000" }.to_string())
        });

        let service = service(repo, generator, echo_renderer());

        let creation = service.create_or_get("https://example.com/a").await.unwrap();

        assert_eq!(creation.code, "fresh000");
        assert_eq!(creation.qr_image, b"http://localhost:3000/fresh000".to_vec());
    }

    #[tokio::test]
    async fn test_create_fails_after_max_attempts() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_original_url()
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_insert()
            .times(MAX_CODE_ATTEMPTS)
            .returning(|_| Ok(InsertOutcome::CodeTaken));

        let service = service(repo, fixed_generator("collide0"), echo_renderer());

        let result = service.create_or_get("https://example.com/a").await;

        assert!(matches!(
            result,
            Err(AppError::CodeSpaceExhausted {
                attempts: MAX_CODE_ATTEMPTS
            })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_original_url().times(0);
        repo.expect_insert().times(0);

        let service = service(repo, MockCodeGenerator::new(), MockQrRenderer::new());

        for url in [
            "not-a-url",
            "ftp://example.com/file",
            "mailto:a@b.c",
            "http://",
            "",
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            "https://example.com/a\r\nSet-Cookie: x=1",
            " https://example.com",
            "https://example.com ",
        ] {
            let result = service.create_or_get(url).await;
            assert!(
                matches!(result, Err(AppError::Validation { .. })),
                "{} should be rejected",
                url
            );
        }
    }

    #[tokio::test]
    async fn test_create_propagates_generator_failure() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_original_url().returning(|_| Ok(None));
        repo.expect_insert().times(0);

        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .returning(|| Err(AppError::internal("Random source unavailable", json!({}))));

        let service = service(repo, generator, MockQrRenderer::new());

        let result = service.create_or_get("https://example.com/a").await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_create_propagates_storage_unavailable() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_original_url()
            .returning(|_| Err(AppError::storage_unavailable("Storage unavailable", json!({}))));

        let service = service(repo, MockCodeGenerator::new(), MockQrRenderer::new());

        let result = service.create_or_get("https://example.com/a").await;

        assert!(matches!(result, Err(AppError::StorageUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_resolve_returns_incremented_record() {
        let mut repo = MockUrlRepository::new();
        repo.expect_record_click()
            .withf(|code, _| code == "Ab3dK9pQ")
            .times(1)
            .returning(|code, at| {
                let mut r = record(1, code, "https://example.com/a", 1);
                r.last_accessed_at = Some(at);
                Ok(Some(r))
            });
        repo.expect_find_by_code().times(0);

        let service = service(repo, MockCodeGenerator::new(), MockQrRenderer::new());

        let resolved = service.resolve("Ab3dK9pQ").await.unwrap();

        assert_eq!(resolved.original_url, "https://example.com/a");
        assert_eq!(resolved.clicks, 1);
        assert!(resolved.last_accessed_at.is_some());
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let mut repo = MockUrlRepository::new();
        repo.expect_record_click()
            .times(1)
            .returning(|_, _| Ok(None));

        let service = service(repo, MockCodeGenerator::new(), MockQrRenderer::new());

        let result = service.resolve("doesnotexist").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_malformed_code_skips_storage() {
        let mut repo = MockUrlRepository::new();
        repo.expect_record_click().times(0);

        let service = service(repo, MockCodeGenerator::new(), MockQrRenderer::new());

        let result = service.resolve("bad code!").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_stats_does_not_count() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(record(1, code, "https://example.com/a", 2))));
        repo.expect_record_click().times(0);

        let service = service(repo, MockCodeGenerator::new(), MockQrRenderer::new());

        let stats = service.get_stats("Ab3dK9pQ").await.unwrap();

        assert_eq!(stats.clicks, 2);
    }

    #[tokio::test]
    async fn test_get_stats_not_found() {
        let mut repo = MockUrlRepository::new();
        repo.expect_find_by_code().times(1).returning(|_| Ok(None));

        let service = service(repo, MockCodeGenerator::new(), MockQrRenderer::new());

        let result = service.get_stats("missing0").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[test]
    fn test_short_url_trims_trailing_slash() {
        let service = service(
            MockUrlRepository::new(),
            MockCodeGenerator::new(),
            MockQrRenderer::new(),
        );

        assert_eq!(service.base_url(), "http://localhost:3000");
        assert_eq!(service.short_url("abc"), "http://localhost:3000/abc");
    }

    #[test]
    fn test_validate_original_url() {
        assert!(validate_original_url("https://example.com").is_ok());
        assert!(validate_original_url("http://localhost:8080/path?q=1#frag").is_ok());
        assert!(validate_original_url("javascript:alert(1)").is_err());
        assert!(validate_original_url("example.com").is_err());
    }
}
