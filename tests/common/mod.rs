#![allow(dead_code)]

use qrlink::application::services::UrlService;
use qrlink::domain::qr::QrOptions;
use qrlink::infrastructure::persistence::MemoryUrlRepository;
use qrlink::infrastructure::qr::PngQrRenderer;
use qrlink::state::AppState;
use qrlink::utils::code_generator::RandomCodeGenerator;
use sqlx::PgPool;
use std::sync::Arc;

pub const BASE_URL: &str = "http://s.example.com";

/// Small images keep tests fast; content is still a valid QR PNG.
pub fn test_qr_options() -> QrOptions {
    QrOptions {
        size: 64,
        ..QrOptions::default()
    }
}

pub fn create_test_service() -> UrlService {
    UrlService::new(
        Arc::new(MemoryUrlRepository::new()),
        Arc::new(RandomCodeGenerator::default()),
        Arc::new(PngQrRenderer::new(test_qr_options())),
        BASE_URL,
    )
}

pub fn create_test_state() -> AppState {
    AppState::new(Arc::new(create_test_service()))
}

pub async fn count_records(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM url_records")
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_record(pool: &PgPool, code: &str, url: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO url_records (code, original_url, qr_image) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(url)
    .bind(vec![0u8; 4])
    .fetch_one(pool)
    .await
    .unwrap()
}
