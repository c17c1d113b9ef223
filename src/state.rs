//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Instant;

use crate::application::services::UrlService;

#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService>,
    /// Process start, reported as uptime by the health check.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(url_service: Arc<UrlService>) -> Self {
        Self {
            url_service,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
