//! Per-identity daily quota on expensive analysis calls.

mod daily;

pub use daily::{next_utc_midnight, window_key, RateLimitDecision, RateLimiter};
