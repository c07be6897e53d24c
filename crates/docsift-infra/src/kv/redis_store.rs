use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use super::{KeyValueStore, KvError};

impl From<redis::RedisError> for KvError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
            KvError::Connection(err.to_string())
        } else {
            KvError::Command(err.to_string())
        }
    }
}

// Check and increment in one server-side step. Returns nil once the counter
// is at the limit.
const INCR_IF_BELOW_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
  return false
end
local count = redis.call('INCR', KEYS[1])
redis.call('EXPIREAT', KEYS[1], ARGV[2])
return count
"#;

/// Redis-backed store. The connection manager reconnects on its own and is
/// cheap to clone per command.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn: ConnectionManager,
    incr_if_below: Script,
}

impl RedisKeyValueStore {
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            incr_if_below: Script::new(INCR_IF_BELOW_SCRIPT),
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    #[tracing::instrument(skip(self), fields(kv.backend = "redis"))]
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[tracing::instrument(skip(self, value), fields(kv.backend = "redis"))]
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(kv.backend = "redis"))]
    async fn incr_if_below(
        &self,
        key: &str,
        limit: i64,
        expire_at: DateTime<Utc>,
    ) -> Result<Option<i64>, KvError> {
        let mut conn = self.conn.clone();
        let count: Option<i64> = self
            .incr_if_below
            .key(key)
            .arg(limit)
            .arg(expire_at.timestamp())
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self, value), fields(kv.backend = "redis"))]
    async fn list_push(&self, key: &str, value: &str, max_len: usize) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let stop = max_len.saturating_sub(1) as isize;
        let _: () = redis::pipe()
            .atomic()
            .lpush(key, value)
            .ignore()
            .ltrim(key, 0, stop)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(kv.backend = "redis"))]
    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, KvError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let items: Vec<String> = conn.lrange(key, 0, (limit - 1) as isize).await?;
        Ok(items)
    }

    #[tracing::instrument(skip(self, value), fields(kv.backend = "redis"))]
    async fn list_remove(&self, key: &str, value: &str) -> Result<usize, KvError> {
        let mut conn = self.conn.clone();
        let removed: usize = conn.lrem(key, 0, value).await?;
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
