//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, code generation and QR rendering and
//! provide the API used by HTTP handlers and the admin CLI.
//!
//! - [`services::url_service::UrlService`] - Short link creation, resolution and reporting

pub mod services;
