//! Docsift Core Library
//!
//! This crate provides core domain models, error types, configuration, and the
//! retry policy shared across all Docsift components.

pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use retry::RetryPolicy;
pub use storage_types::{StorageBackend, StorageErrorKind};
