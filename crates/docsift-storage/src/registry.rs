//! Storage backend resolution.
//!
//! The registry is built once at startup from configuration and handed to the
//! HTTP layer. `resolve()` constructs the backend on first use and returns the
//! same instance for the rest of the process lifetime.

use std::sync::Arc;

use docsift_core::{Config, RetryPolicy, StorageBackend};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::StorageConfig;
use crate::inline::InlineStorage;
use crate::object::ObjectStorage;
use crate::relational::RelationalStorage;
use crate::traits::{StorageAdapter, StorageResult};

/// The resolved backend. Only the relational variant supports stream reads.
#[derive(Clone)]
pub enum ConfiguredStorage {
    ContentAddressable(Arc<dyn StorageAdapter>),
    Relational(Arc<RelationalStorage>),
    Inline(InlineStorage),
}

impl ConfiguredStorage {
    pub fn backend(&self) -> StorageBackend {
        match self {
            ConfiguredStorage::ContentAddressable(adapter) => adapter.backend(),
            ConfiguredStorage::Relational(_) => StorageBackend::Relational,
            ConfiguredStorage::Inline(_) => StorageBackend::Inline,
        }
    }

    /// External backend behind the adapter contract; `None` for inline mode.
    pub fn adapter(&self) -> Option<Arc<dyn StorageAdapter>> {
        match self {
            ConfiguredStorage::ContentAddressable(adapter) => Some(adapter.clone()),
            ConfiguredStorage::Relational(storage) => {
                Some(storage.clone() as Arc<dyn StorageAdapter>)
            }
            ConfiguredStorage::Inline(_) => None,
        }
    }

    pub fn relational(&self) -> Option<&Arc<RelationalStorage>> {
        match self {
            ConfiguredStorage::Relational(storage) => Some(storage),
            _ => None,
        }
    }

    pub fn inline(&self) -> Option<&InlineStorage> {
        match self {
            ConfiguredStorage::Inline(inline) => Some(inline),
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        match self {
            ConfiguredStorage::ContentAddressable(adapter) => adapter.is_configured(),
            ConfiguredStorage::Relational(storage) => storage.is_configured(),
            ConfiguredStorage::Inline(_) => true,
        }
    }
}

pub struct StorageRegistry {
    config: StorageConfig,
    retry: RetryPolicy,
    storage: OnceCell<Arc<ConfiguredStorage>>,
}

impl StorageRegistry {
    pub fn new(config: StorageConfig, retry: RetryPolicy) -> Self {
        Self {
            config,
            retry,
            storage: OnceCell::new(),
        }
    }

    /// Validate the backend-specific configuration. Fails on missing fields.
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        let storage_config = StorageConfig::from_config(config)?;
        let retry = RetryPolicy::new(config.analysis_max_retries(), config.analysis_retry_base());
        Ok(Self::new(storage_config, retry))
    }

    /// Registry with an already constructed backend (in-memory stores, tests).
    pub fn with_storage(config: StorageConfig, storage: ConfiguredStorage) -> Self {
        Self {
            config,
            retry: RetryPolicy::default(),
            storage: OnceCell::new_with(Some(Arc::new(storage))),
        }
    }

    pub fn backend(&self) -> StorageBackend {
        self.config.backend()
    }

    /// Construct the backend on first call; later calls return the same instance.
    pub async fn resolve(&self) -> StorageResult<Arc<ConfiguredStorage>> {
        let storage = self
            .storage
            .get_or_try_init(|| async {
                let storage = build(&self.config, self.retry).await?;
                tracing::info!(
                    backend = %storage.backend(),
                    config = %self.config.masked(),
                    "Storage backend initialized"
                );
                Ok::<_, crate::traits::StorageError>(Arc::new(storage))
            })
            .await?;
        Ok(storage.clone())
    }

    pub fn masked_config(&self) -> Value {
        self.config.masked()
    }

    /// Drop the resolved backend so the next `resolve()` builds a fresh one.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn reset(&mut self) {
        self.storage.take();
    }
}

async fn build(config: &StorageConfig, retry: RetryPolicy) -> StorageResult<ConfiguredStorage> {
    let redactor = config.redactor();
    match config {
        StorageConfig::ObjectStore(c) => {
            let storage = ObjectStorage::s3(c, retry, redactor)?;
            Ok(ConfiguredStorage::ContentAddressable(Arc::new(storage)))
        }
        StorageConfig::Relational(c) => {
            let storage = RelationalStorage::connect(c, redactor).await?;
            Ok(ConfiguredStorage::Relational(Arc::new(storage)))
        }
        StorageConfig::Inline(c) => Ok(ConfiguredStorage::Inline(InlineStorage::new(c.max_bytes))),
    }
}
