//! Storage abstraction trait
//!
//! This module defines the contract every external storage backend implements.

use async_trait::async_trait;
use bytes::Bytes;
use docsift_core::models::{AccessUrl, StorageMetadata, StoredObject};
use docsift_core::{AppError, StorageBackend, StorageErrorKind};
use thiserror::Error;

/// Storage operation errors
///
/// Messages are redacted before they are wrapped here; they never carry
/// credentials.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Size limit exceeded: {size} bytes (max {limit} bytes)")]
    SizeLimitExceeded { size: u64, limit: u64 },
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::UploadFailed(_) => StorageErrorKind::UploadFailed,
            StorageError::DownloadFailed(_) => StorageErrorKind::DownloadFailed,
            StorageError::DeleteFailed(_) => StorageErrorKind::DeleteFailed,
            StorageError::NotFound(_) => StorageErrorKind::NotFound,
            StorageError::ConfigError(_) => StorageErrorKind::ConfigurationError,
            StorageError::SizeLimitExceeded { .. } => StorageErrorKind::SizeLimitExceeded,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Callers only keep `backend` + `storage_key` from the returned
/// [`StoredObject`]; everything else about the backend stays behind this trait.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Persist `data` and return the handle needed to read or delete it later.
    async fn upload(&self, data: Bytes, metadata: &StorageMetadata) -> StorageResult<StoredObject>;

    /// URL (or endpoint) that grants read access to the content.
    async fn access_url(&self, storage_key: &str) -> StorageResult<AccessUrl>;

    /// Remove the content. Deleting a missing key succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Whether the backend has everything it needs to serve requests.
    fn is_configured(&self) -> bool;

    fn backend(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::ErrorMetadata;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            StorageError::NotFound("k".into()).kind(),
            StorageErrorKind::NotFound
        );
        assert_eq!(
            StorageError::ConfigError("x".into()).kind(),
            StorageErrorKind::ConfigurationError
        );
        assert_eq!(
            StorageError::SizeLimitExceeded { size: 2, limit: 1 }.kind(),
            StorageErrorKind::SizeLimitExceeded
        );
    }

    #[test]
    fn test_conversion_to_app_error() {
        let app: AppError = StorageError::DeleteFailed("boom".into()).into();
        assert_eq!(app.http_status_code(), 502);
        assert_eq!(app.error_code(), "DELETE_FAILED");

        let app: AppError = StorageError::NotFound("k".into()).into();
        assert_eq!(app.http_status_code(), 404);
    }
}
