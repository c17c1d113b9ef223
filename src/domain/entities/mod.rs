//! Core domain entities.
//!
//! - [`UrlRecord`] - A short code mapped to an original URL, with its QR image
//!   and click counters
//! - [`UrlSummary`] - Listing projection of a record
//! - [`NewUrlRecord`] - Input for inserting a record

pub mod url_record;

pub use url_record::{NewUrlRecord, UrlRecord, UrlSummary};
