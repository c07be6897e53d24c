//! Shared key/value store
//!
//! Cache entries, daily quota counters and per-collection document lists live
//! here so several service instances can share them. Redis is used in
//! production; the in-memory store has the same semantics for single-instance
//! development and tests.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::InMemoryKeyValueStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisKeyValueStore;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("Key/value store connection failed: {0}")]
    Connection(String),

    #[error("Key/value store command failed: {0}")]
    Command(String),

    #[error("Invalid value stored at {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Key/value store not available: {0}")]
    Unsupported(String),
}

impl From<KvError> for docsift_core::AppError {
    fn from(err: KvError) -> Self {
        match err {
            KvError::InvalidValue { .. } => docsift_core::AppError::Internal(err.to_string()),
            _ => docsift_core::AppError::ServiceUnavailable(err.to_string()),
        }
    }
}

/// Operations the service needs from the shared store.
///
/// Every multi-step operation (`incr_if_below`, `list_push`) is atomic in the
/// implementation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Set `key` to `value`, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Increment the integer at `key` and set its absolute expiry, but only
    /// while the current value is below `limit`. Returns the new value, or
    /// `None` when the counter is already at the limit. A missing key counts
    /// from 0.
    async fn incr_if_below(
        &self,
        key: &str,
        limit: i64,
        expire_at: DateTime<Utc>,
    ) -> Result<Option<i64>, KvError>;

    /// Push `value` to the head of the list at `key`, keeping at most `max_len`
    /// entries (oldest evicted).
    async fn list_push(&self, key: &str, value: &str, max_len: usize) -> Result<(), KvError>;

    /// Up to `limit` entries from the head of the list.
    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, KvError>;

    /// Remove every entry equal to `value`. Returns how many were removed.
    async fn list_remove(&self, key: &str, value: &str) -> Result<usize, KvError>;

    async fn ping(&self) -> Result<(), KvError>;

    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

/// Create the shared store: Redis when a URL is configured, in-memory otherwise.
pub async fn create_kv_store(redis_url: Option<&str>) -> Result<Arc<dyn KeyValueStore>, KvError> {
    match redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            let store = RedisKeyValueStore::connect(url).await?;
            tracing::info!("Using Redis key/value store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(KvError::Unsupported(
            "REDIS_URL is set but the redis feature is disabled".to_string(),
        )),
        None => {
            tracing::warn!(
                "REDIS_URL not set, using in-memory key/value store (single instance only)"
            );
            Ok(Arc::new(InMemoryKeyValueStore::new()))
        }
    }
}
