//! Docsift Analysis Library
//!
//! AI description/summary generation for uploaded documents:
//! rate limit → cache → model call (timeout, retries) → validation → cache write,
//! with a deterministic fallback whenever the model cannot produce a result.

pub mod anthropic;
pub mod cache;
pub mod client;
pub mod fallback;
pub mod fingerprint;
pub mod orchestrator;
pub mod validator;

// Re-export commonly used types
pub use anthropic::AnthropicTransport;
pub use cache::{CacheWrite, ResultCache};
pub use client::{AnalysisClient, Attachment, ModelCallError, ModelRequest, ModelTransport};
pub use fingerprint::fingerprint;
pub use orchestrator::{AnalysisError, AnalysisOrchestrator, AnalysisOutcome};
pub use validator::{validate_response, ValidationError};
