//! Utility functions shared across the application.
//!
//! - [`code_generator`] - Short code generation and validation

pub mod code_generator;
