//! Application state shared by every handler.

use std::sync::Arc;

use docsift_analysis::AnalysisOrchestrator;
use docsift_core::Config;
use docsift_infra::KeyValueStore;
use docsift_storage::StorageRegistry;

use crate::services::DocumentIndex;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub kv: Arc<dyn KeyValueStore>,
    pub storage: Arc<StorageRegistry>,
    pub analysis: AnalysisState,
    pub documents: DocumentIndex,
}

/// Analysis pipeline plus the facts `/health` reports about it.
#[derive(Clone)]
pub struct AnalysisState {
    pub orchestrator: AnalysisOrchestrator,
    pub model: Option<String>,
}

impl AnalysisState {
    pub fn enabled(&self) -> bool {
        self.model.is_some()
    }
}
