//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short link redirect, counts a click
//! - `GET  /health`      - Health check: storage, version, uptime
//! - `/api/*`            - REST API (rate limited per client IP)
//! - anything else       - JSON `404 Not Found`
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Any origin, method and header
//! - **Security headers** - `nosniff`, frame and referrer policies
//! - **Rate limiting** - Per-IP token bucket on `/api` (configurable for proxy deployments)
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{fallback_handler, health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, security_headers, tracing};
use crate::config::RateLimitSettings;
use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate_limit` - per-IP limits applied to `/api`
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
///
/// The rate limiter needs the peer address, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Errors
///
/// Returns an error if the rate limit settings are invalid.
pub fn app_router(
    state: AppState,
    rate_limit: RateLimitSettings,
    behind_proxy: bool,
) -> Result<NormalizePath<Router>> {
    let api_router = if behind_proxy {
        api::routes::api_routes().layer(rate_limit::proxy_layer(rate_limit)?)
    } else {
        api::routes::api_routes().layer(rate_limit::layer(rate_limit)?)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .fallback(fallback_handler)
        .with_state(state);

    let router = security_headers::apply(router)
        .layer(cors)
        .layer(tracing::layer());

    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}
