//! Domain layer containing business entities and storage contracts.
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Business logic lives in [`crate::application::services`].
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Storage trait definitions
//! - [`qr`] - QR rendering contract

pub mod entities;
pub mod qr;
pub mod repositories;
