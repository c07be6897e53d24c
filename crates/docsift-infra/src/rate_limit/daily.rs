use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use serde::Serialize;

use crate::kv::{KeyValueStore, KvError};

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window limiter: one counter per identity per UTC calendar day.
///
/// The limit check and the increment are a single store operation; rejected
/// requests never consume quota.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    daily_limit: u32,
}

/// Counter key for `identity` in the window containing `now`.
pub fn window_key(identity: &str, now: DateTime<Utc>) -> String {
    format!("ratelimit:{}:{}", identity, now.format("%Y-%m-%d"))
}

/// End of the UTC day containing `now`.
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Days::new(1);
    tomorrow.and_time(NaiveTime::MIN).and_utc()
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, daily_limit: u32) -> Self {
        Self { store, daily_limit }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub async fn check_and_increment(&self, identity: &str) -> Result<RateLimitDecision, KvError> {
        self.check_and_increment_at(identity, Utc::now()).await
    }

    #[tracing::instrument(skip(self), fields(limit = self.daily_limit))]
    pub async fn check_and_increment_at(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, KvError> {
        let key = window_key(identity, now);
        let reset_at = next_utc_midnight(now);

        let Some(count) = self
            .store
            .incr_if_below(&key, i64::from(self.daily_limit), reset_at)
            .await?
        else {
            tracing::warn!(identity = %identity, "Daily analysis quota exhausted");
            return Ok(RateLimitDecision {
                allowed: false,
                limit: self.daily_limit,
                remaining: 0,
                reset_at,
            });
        };
        let used = u32::try_from(count.max(0)).unwrap_or(u32::MAX);

        tracing::debug!(identity = %identity, count = used, "Quota consumed");

        Ok(RateLimitDecision {
            allowed: true,
            limit: self.daily_limit,
            remaining: self.daily_limit.saturating_sub(used),
            reset_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKeyValueStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;

    /// In-memory store with a network-like delay before every command.
    struct SlowStore {
        inner: InMemoryKeyValueStore,
        delay: Duration,
    }

    #[async_trait]
    impl KeyValueStore for SlowStore {
        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            tokio::time::sleep(self.delay).await;
            self.inner.get(key).await
        }
        async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
            tokio::time::sleep(self.delay).await;
            self.inner.set_with_ttl(key, value, ttl).await
        }
        async fn incr_if_below(
            &self,
            key: &str,
            limit: i64,
            expire_at: DateTime<Utc>,
        ) -> Result<Option<i64>, KvError> {
            tokio::time::sleep(self.delay).await;
            self.inner.incr_if_below(key, limit, expire_at).await
        }
        async fn list_push(&self, key: &str, value: &str, max_len: usize) -> Result<(), KvError> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_push(key, value, max_len).await
        }
        async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, KvError> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_range(key, limit).await
        }
        async fn list_remove(&self, key: &str, value: &str) -> Result<usize, KvError> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_remove(key, value).await
        }
        async fn ping(&self) -> Result<(), KvError> {
            self.inner.ping().await
        }
        fn backend_name(&self) -> &'static str {
            "slow"
        }
    }

    fn limiter(limit: u32) -> RateLimiter {
        RateLimiter::new(Arc::new(InMemoryKeyValueStore::new()), limit)
    }

    #[test]
    fn test_window_key_and_reset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        assert_eq!(window_key("alice", now), "ratelimit:alice:2024-03-31");
        assert_eq!(
            next_utc_midnight(now),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_limit_boundary() {
        let limiter = limiter(3);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check_and_increment("alice").await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = limiter.check_and_increment("alice").await.unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.limit, 3);

        let other = limiter.check_and_increment("bob").await.unwrap();
        assert!(other.allowed);
    }

    #[tokio::test]
    async fn test_rejections_do_not_increment() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let limiter = RateLimiter::new(store.clone(), 1);
        let now = Utc::now();

        limiter.check_and_increment_at("alice", now).await.unwrap();
        limiter.check_and_increment_at("alice", now).await.unwrap();
        limiter.check_and_increment_at("alice", now).await.unwrap();

        let stored = store.get(&window_key("alice", now)).await.unwrap();
        assert_eq!(stored.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_new_day_gets_a_fresh_window() {
        let limiter = limiter(1);
        let today = Utc::now();
        let tomorrow = today + chrono::Duration::days(1);

        assert!(limiter.check_and_increment_at("alice", today).await.unwrap().allowed);
        assert!(!limiter.check_and_increment_at("alice", today).await.unwrap().allowed);
        assert!(limiter.check_and_increment_at("alice", tomorrow).await.unwrap().allowed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_never_exceed_limit() {
        let store = Arc::new(SlowStore {
            inner: InMemoryKeyValueStore::new(),
            delay: Duration::from_millis(5),
        });
        let limiter = RateLimiter::new(store.clone(), 3);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check_and_increment("alice").await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 3);

        let stored = store
            .get(&window_key("alice", Utc::now()))
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("3"));
    }
}
