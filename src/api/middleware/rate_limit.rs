//! Rate limiting middleware using token bucket algorithm.

use anyhow::{Context, Result};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::config::RateLimitSettings;

/// Creates a per-IP rate limiter keyed on the socket peer address.
///
/// # Limits
///
/// Each client may send `settings.burst` requests at once and regains one
/// request every `settings.replenish_ms` milliseconds. With the defaults
/// (burst 100, one per 9s) this allows roughly 100 requests per 15 minutes.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Errors
///
/// Returns an error if the burst size or replenish period is zero.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .layer(rate_limit::layer(RateLimitSettings::default())?);
/// ```
pub fn layer(
    settings: RateLimitSettings,
) -> Result<GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(settings.replenish_ms)
            .burst_size(settings.burst)
            .finish()
            .context("Invalid rate limit settings")?,
    );

    Ok(GovernorLayer::new(governor_conf))
}

/// Creates the same limiter for deployments behind a reverse proxy.
///
/// The client IP is read from `X-Forwarded-For`, `X-Real-IP` or `Forwarded`
/// headers, falling back to the peer address. Only use this when the proxy
/// is trusted to overwrite those headers.
pub fn proxy_layer(
    settings: RateLimitSettings,
) -> Result<GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>>
{
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(settings.replenish_ms)
            .burst_size(settings.burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .context("Invalid rate limit settings")?,
    );

    Ok(GovernorLayer::new(governor_conf))
}
