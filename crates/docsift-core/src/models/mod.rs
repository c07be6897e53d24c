//! Data models for the application
//!
//! Organized by domain: analysis results, storage inputs/outputs, and the
//! document metadata kept per collection.

mod analysis;
mod document;
mod storage;

// Re-export all models for convenient imports
pub use analysis::*;
pub use document::*;
pub use storage::*;
