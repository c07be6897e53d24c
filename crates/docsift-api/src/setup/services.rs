//! Construct the shared services from configuration.

use anyhow::{Context, Result};
use docsift_analysis::{
    AnalysisClient, AnalysisOrchestrator, AnthropicTransport, ModelTransport, ResultCache,
};
use docsift_core::models::OutputLimits;
use docsift_core::{Config, RetryPolicy};
use docsift_infra::{create_kv_store, KeyValueStore, RateLimiter};
use docsift_storage::StorageRegistry;
use std::sync::Arc;

use crate::services::DocumentIndex;
use crate::state::{AnalysisState, AppState};

pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let registry = StorageRegistry::from_config(config).context("Invalid storage configuration")?;
    let storage = registry
        .resolve()
        .await
        .context("Failed to initialize storage backend")?;
    if !storage.is_configured() {
        anyhow::bail!("Storage backend {} is not configured", storage.backend());
    }

    let kv = create_kv_store(config.redis_url())
        .await
        .context("Failed to connect to key/value store")?;

    let analysis = build_analysis(config, kv.clone())?;

    Ok(Arc::new(AppState {
        config: config.clone(),
        documents: DocumentIndex::new(kv.clone(), config.document_list_max()),
        kv,
        storage: Arc::new(registry),
        analysis,
    }))
}

pub fn build_analysis(config: &Config, kv: Arc<dyn KeyValueStore>) -> Result<AnalysisState> {
    let (transport, model): (Option<Arc<dyn ModelTransport>>, Option<String>) =
        match config.anthropic_api_key() {
            Some(api_key) => {
                let transport: Arc<dyn ModelTransport> =
                    Arc::new(AnthropicTransport::new(api_key, config.anthropic_model())?);
                (Some(transport), Some(config.anthropic_model().to_string()))
            }
            None => {
                tracing::warn!("ANTHROPIC_API_KEY not set, every analysis will use the fallback");
                (None, None)
            }
        };

    let client = AnalysisClient::new(
        transport,
        config.analysis_timeout(),
        RetryPolicy::new(config.analysis_max_retries(), config.analysis_retry_base()),
        OutputLimits::default(),
    );

    let orchestrator = AnalysisOrchestrator::new(
        RateLimiter::new(kv.clone(), config.analysis_daily_limit()),
        ResultCache::new(kv, config.analysis_cache_ttl()),
        client,
    );

    Ok(AnalysisState {
        orchestrator,
        model,
    })
}
