//! QR image rendering.

pub mod png;

pub use png::PngQrRenderer;
