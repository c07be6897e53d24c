use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{KeyValueStore, KvError};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local store with Redis-like semantics (TTL, absolute expiry,
/// bounded lists). A single lock makes every operation atomic.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrong_type(key: &str) -> KvError {
        KvError::Command(format!(
            "WRONGTYPE operation against key {} holding the wrong kind of value",
            key
        ))
    }
}

/// Drop `key` if it has expired and return the live entry, if any.
fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Utc::now();
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| KvError::Command(format!("invalid TTL: {}", e)))?;
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Utc::now() + ttl),
            },
        );
        Ok(())
    }

    async fn incr_if_below(
        &self,
        key: &str,
        limit: i64,
        expire_at: DateTime<Utc>,
    ) -> Result<Option<i64>, KvError> {
        let mut entries = self.entries.lock().await;
        let current = match live(&mut entries, key) {
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => text.parse::<i64>().map_err(|_| KvError::InvalidValue {
                key: key.to_string(),
                message: "value is not an integer".to_string(),
            })?,
            Some(_) => return Err(Self::wrong_type(key)),
            None => 0,
        };

        if current >= limit {
            return Ok(None);
        }

        let next = current + 1;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(next.to_string()),
                expires_at: Some(expire_at),
            },
        );
        Ok(Some(next))
    }

    async fn list_push(&self, key: &str, value: &str, max_len: usize) -> Result<(), KvError> {
        let mut entries = self.entries.lock().await;
        if live(&mut entries, key).is_none() {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::List(VecDeque::new()),
                    expires_at: None,
                },
            );
        }

        match entries.get_mut(key) {
            Some(Entry {
                value: Value::List(list),
                ..
            }) => {
                list.push_front(value.to_string());
                list.truncate(max_len);
                Ok(())
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, KvError> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(list.iter().take(limit).cloned().collect()),
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn list_remove(&self, key: &str, value: &str) -> Result<usize, KvError> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            Some(Entry {
                value: Value::List(list),
                ..
            }) => {
                let before = list.len();
                list.retain(|item| item != value);
                Ok(before - list.len())
            }
            Some(_) => Err(Self::wrong_type(key)),
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
