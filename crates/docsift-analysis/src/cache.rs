use std::sync::Arc;
use std::time::Duration;

use docsift_core::models::AnalysisResult;
use docsift_infra::KeyValueStore;

/// What a [`ResultCache::put`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Written,
    SkippedFallback,
    SkippedIdentical,
    Failed,
}

/// Fingerprint → analysis result, with a per-entry TTL.
///
/// The cache never fails its caller: store errors on read count as a miss and
/// store errors on write are logged and dropped.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

pub fn cache_key(fingerprint: &str) -> String {
    format!("analysis:{}", fingerprint)
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn get(&self, fingerprint: &str) -> Option<AnalysisResult> {
        let key = cache_key(fingerprint);
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Analysis cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<AnalysisResult>(&raw) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Corrupt analysis cache entry ignored");
                None
            }
        }
    }

    /// Write through a successful result. Fallbacks are never stored; an
    /// identical existing entry is left alone, anything else is overwritten.
    pub async fn put(&self, fingerprint: &str, result: &AnalysisResult) -> CacheWrite {
        if result.is_fallback {
            tracing::debug!(fingerprint = %fingerprint, "Fallback result not cached");
            return CacheWrite::SkippedFallback;
        }

        let key = cache_key(fingerprint);
        let serialized = match serde_json::to_string(result) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to serialize analysis result");
                return CacheWrite::Failed;
            }
        };

        match self.store.get(&key).await {
            Ok(Some(existing)) if existing == serialized => {
                tracing::debug!(key = %key, "Identical analysis already cached");
                return CacheWrite::SkippedIdentical;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Analysis cache pre-write read failed");
            }
        }

        match self.store.set_with_ttl(&key, &serialized, self.ttl).await {
            Ok(()) => {
                tracing::debug!(key = %key, ttl_secs = self.ttl.as_secs(), "Analysis result cached");
                CacheWrite::Written
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Analysis cache write failed");
                CacheWrite::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use docsift_infra::{InMemoryKeyValueStore, KvError};

    fn result(description: &str) -> AnalysisResult {
        AnalysisResult {
            description: description.to_string(),
            summary: "s".to_string(),
            is_fallback: false,
        }
    }

    fn cache() -> ResultCache {
        ResultCache::new(
            Arc::new(InMemoryKeyValueStore::new()),
            Duration::from_secs(7 * 24 * 3600),
        )
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = cache();
        assert!(cache.get("fp").await.is_none());
        assert_eq!(cache.put("fp", &result("d")).await, CacheWrite::Written);
        assert_eq!(cache.get("fp").await, Some(result("d")));
    }

    #[tokio::test]
    async fn test_fallbacks_never_written() {
        let cache = cache();
        let mut fallback = result("generic");
        fallback.is_fallback = true;
        assert_eq!(cache.put("fp", &fallback).await, CacheWrite::SkippedFallback);
        assert!(cache.get("fp").await.is_none());
    }

    #[tokio::test]
    async fn test_identical_write_skipped_and_different_overwrites() {
        let cache = cache();
        cache.put("fp", &result("first")).await;
        assert_eq!(
            cache.put("fp", &result("first")).await,
            CacheWrite::SkippedIdentical
        );
        assert_eq!(cache.put("fp", &result("second")).await, CacheWrite::Written);
        assert_eq!(cache.get("fp").await, Some(result("second")));
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
            Err(KvError::Connection("down".into()))
        }
        async fn set_with_ttl(&self, _: &str, _: &str, _: Duration) -> Result<(), KvError> {
            Err(KvError::Connection("down".into()))
        }
        async fn incr_if_below(
            &self,
            _: &str,
            _: i64,
            _: DateTime<Utc>,
        ) -> Result<Option<i64>, KvError> {
            Err(KvError::Connection("down".into()))
        }
        async fn list_push(&self, _: &str, _: &str, _: usize) -> Result<(), KvError> {
            Err(KvError::Connection("down".into()))
        }
        async fn list_range(&self, _: &str, _: usize) -> Result<Vec<String>, KvError> {
            Err(KvError::Connection("down".into()))
        }
        async fn list_remove(&self, _: &str, _: &str) -> Result<usize, KvError> {
            Err(KvError::Connection("down".into()))
        }
        async fn ping(&self) -> Result<(), KvError> {
            Err(KvError::Connection("down".into()))
        }
        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_store_errors_are_absorbed() {
        let cache = ResultCache::new(Arc::new(BrokenStore), Duration::from_secs(60));
        assert!(cache.get("fp").await.is_none());
        assert_eq!(cache.put("fp", &result("d")).await, CacheWrite::Failed);
    }
}
