//! Shared library for the anime catalog client.
//!
//! This crate provides common functionality used by the catalog engine and
//! its command-line front end:
//! - Configuration management
//! - Logging infrastructure
//! - Catalog data models

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
