//! Docsift Infrastructure Library
//!
//! Shared infrastructure used by the Docsift service:
//! - Key/value store (Redis or in-memory) for cache entries, quota counters and document lists
//! - Daily per-identity rate limiting
//! - Telemetry initialization
//! - Request ID middleware
//! - HTTP error response body

pub mod error;
pub mod kv;
pub mod middleware;
pub mod rate_limit;
pub mod telemetry;

// Re-export commonly used types
pub use error::ErrorResponse;
pub use kv::{create_kv_store, InMemoryKeyValueStore, KeyValueStore, KvError};
pub use middleware::{get_request_id, request_id_middleware, RequestId};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};

#[cfg(feature = "redis")]
pub use kv::RedisKeyValueStore;
