//! Docsift API Library
//!
//! HTTP surface for the analysis pipeline and document storage: handlers,
//! caller extractors, error rendering and application setup.

mod handlers;
mod services;
mod utils;

pub mod error;
pub mod middleware;
pub mod setup;
pub mod state;

pub use error::HttpAppError;
pub use services::{DocumentIndex, DocumentService};
pub use state::{AnalysisState, AppState};
