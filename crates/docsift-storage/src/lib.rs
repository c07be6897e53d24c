//! Docsift Storage Library
//!
//! Storage abstraction for document content and its backends:
//! - Object store (S3-compatible, via `object_store`), content-addressable keys and presigned URLs
//! - Relational (PostgreSQL `BYTEA`), read through the service's streaming endpoint
//! - Inline, content embedded base64 in the document metadata
//!
//! # Storage key format
//!
//! Object store keys are `documents/{owner}/{collection}/{YYYYMMDDTHHMMSS}/{random}/{filename}`
//! (see the `keys` module). Relational keys are row UUIDs. Callers only ever keep
//! `backend` + `storage_key`.

pub mod config;
pub mod inline;
pub(crate) mod keys;
pub mod object;
pub mod redact;
pub mod registry;
pub mod relational;
pub mod traits;

// Re-export commonly used types
pub use config::{InlineConfig, ObjectStoreConfig, RelationalConfig, StorageConfig};
pub use docsift_core::StorageBackend;
pub use inline::InlineStorage;
#[cfg(any(test, feature = "test-utils"))]
pub use object::StaticUrlSigner;
pub use object::{ObjectStorage, UrlSigner};
pub use redact::SecretRedactor;
pub use registry::{ConfiguredStorage, StorageRegistry};
pub use relational::{RelationalStorage, StoredBlob};
pub use traits::{StorageAdapter, StorageError, StorageResult};
