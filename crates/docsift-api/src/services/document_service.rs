//! Document lifecycle: store + analyze on upload, access, stream, delete.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use docsift_analysis::{AnalysisError, AnalysisOutcome};
use docsift_core::models::{AnalysisRequest, Document, StorageMetadata};
use docsift_core::{AppError, StorageBackend};
use docsift_storage::{ConfiguredStorage, StorageAdapter, StorageError, StoredBlob};
use tokio::time::Instant;
use uuid::Uuid;

use crate::middleware::CollectionContext;
use crate::services::document_index::IndexedDocument;
use crate::state::AppState;

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub display_name: String,
    pub content_type: String,
}

/// Where a document's content can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentAccess {
    Url {
        url: String,
        expires_in: Option<Duration>,
        backend: StorageBackend,
    },
    Inline {
        content_type: String,
        content: String,
    },
}

pub struct DocumentService<'a> {
    state: &'a AppState,
}

impl<'a> DocumentService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    async fn storage(&self) -> Result<Arc<ConfiguredStorage>, AppError> {
        Ok(self.state.storage.resolve().await?)
    }

    /// Store the content and analyze it concurrently. Storage failure fails
    /// the upload; analysis failure (including quota) only drops the analysis.
    pub async fn upload(
        &self,
        ctx: &CollectionContext,
        file: UploadedFile,
    ) -> Result<Document, AppError> {
        let started = Instant::now();
        let max_bytes = self.state.config.max_upload_size_bytes();
        if file.data.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                max_bytes / 1024 / 1024
            )));
        }
        if file.data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }

        let storage = self.storage().await?;
        let metadata = StorageMetadata {
            display_name: file.display_name.clone(),
            content_type: file.content_type.clone(),
            byte_size: file.data.len() as u64,
            owner_id: ctx.owner_id.clone(),
            collection_id: ctx.collection_id.clone(),
        };
        let request = AnalysisRequest::new(file.data, file.content_type, file.display_name);

        let (stored, analysis) = tokio::join!(
            store(&storage, &metadata, &request.content),
            self.state
                .analysis
                .orchestrator
                .analyze(&ctx.owner_id, &request)
        );

        let mut document = stored?;
        match analysis {
            Ok(AnalysisOutcome { result, cache_hit, .. }) => {
                tracing::debug!(cache_hit, is_fallback = result.is_fallback, "Upload analysis ready");
                document = document.with_analysis(&result);
            }
            Err(AnalysisError::QuotaExceeded(decision)) => {
                tracing::info!(
                    owner_id = %ctx.owner_id,
                    reset_at = %decision.reset_at,
                    "Quota exhausted, document saved without analysis"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Analysis unavailable, document saved without analysis");
            }
        }

        if let Err(e) = self.state.documents.insert(&document).await {
            tracing::error!(error = %e, document_id = %document.id, "Failed to record document metadata");
            self.discard_content(&storage, &document).await;
            return Err(e.into());
        }

        tracing::info!(
            document_id = %document.id,
            backend = %document.backend,
            byte_size = document.byte_size,
            has_analysis = document.summary.is_some(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Document uploaded"
        );
        Ok(document)
    }

    async fn discard_content(&self, storage: &ConfiguredStorage, document: &Document) {
        let (Some(adapter), Some(key)) = (storage.adapter(), document.storage_key.as_deref()) else {
            return;
        };
        if let Err(e) = adapter.delete(key).await {
            tracing::warn!(error = %e, storage_key = %key, "Failed to discard orphaned content");
        }
    }

    pub async fn list(&self, ctx: &CollectionContext) -> Result<Vec<Document>, AppError> {
        Ok(self.state.documents.list(&ctx.collection_id).await?)
    }

    async fn find(&self, ctx: &CollectionContext, id: Uuid) -> Result<IndexedDocument, AppError> {
        self.state
            .documents
            .find(&ctx.collection_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
    }

    /// The external adapter for a stored document, provided it matches the
    /// configured backend.
    async fn adapter_for(
        &self,
        document: &Document,
    ) -> Result<(Arc<dyn StorageAdapter>, String), AppError> {
        let storage = self.storage().await?;
        let key = document
            .storage_key
            .clone()
            .ok_or_else(|| AppError::Internal("Stored document has no storage key".to_string()))?;

        match storage.adapter() {
            Some(adapter) if storage.backend() == document.backend => Ok((adapter, key)),
            _ => Err(StorageError::ConfigError(format!(
                "document was stored with the {} backend but {} is configured",
                document.backend,
                storage.backend()
            ))
            .into()),
        }
    }

    pub async fn access(&self, ctx: &CollectionContext, id: Uuid) -> Result<DocumentAccess, AppError> {
        let document = self.find(ctx, id).await?.document;

        if document.backend == StorageBackend::Inline {
            let content = document
                .inline_content
                .ok_or_else(|| AppError::Internal("Inline document has no content".to_string()))?;
            return Ok(DocumentAccess::Inline {
                content_type: document.content_type,
                content,
            });
        }

        let (adapter, key) = self.adapter_for(&document).await?;
        let access = adapter.access_url(&key).await?;
        Ok(DocumentAccess::Url {
            url: access.url,
            expires_in: access.expires_in,
            backend: document.backend,
        })
    }

    /// Read relational content for the streaming endpoint. Blobs outside the
    /// caller's collection are reported as missing.
    pub async fn stream(
        &self,
        ctx: &CollectionContext,
        storage_key: &str,
    ) -> Result<StoredBlob, AppError> {
        let storage = self.storage().await?;
        let relational = storage.relational().ok_or_else(|| {
            AppError::NotFound("Streaming is only available for the relational backend".to_string())
        })?;

        let blob = relational.read(storage_key).await?;
        if blob.collection_id != ctx.collection_id {
            tracing::warn!(
                storage_key = %storage_key,
                collection_id = %ctx.collection_id,
                "Stream request for a blob in another collection"
            );
            return Err(StorageError::NotFound(storage_key.to_string()).into());
        }
        Ok(blob)
    }

    /// Delete backend content first; metadata is removed only once that succeeds.
    pub async fn delete(&self, ctx: &CollectionContext, id: Uuid) -> Result<(), AppError> {
        let entry = self.find(ctx, id).await?;

        if entry.document.backend != StorageBackend::Inline {
            let (adapter, key) = self.adapter_for(&entry.document).await?;
            adapter.delete(&key).await.map_err(|e| {
                tracing::error!(
                    error = %e,
                    document_id = %id,
                    "Backend delete failed, keeping document metadata"
                );
                AppError::from(e)
            })?;
        }

        self.state.documents.remove(&entry).await?;
        tracing::info!(document_id = %id, backend = %entry.document.backend, "Document deleted");
        Ok(())
    }
}

async fn store(
    storage: &ConfiguredStorage,
    metadata: &StorageMetadata,
    data: &[u8],
) -> Result<Document, AppError> {
    match storage {
        ConfiguredStorage::Inline(inline) => {
            let content = inline.encode(data)?;
            Ok(Document::inline(metadata, content))
        }
        ConfiguredStorage::ContentAddressable(_) | ConfiguredStorage::Relational(_) => {
            let adapter = storage
                .adapter()
                .ok_or_else(|| AppError::Internal("Storage adapter unavailable".to_string()))?;
            let stored = adapter
                .upload(Bytes::copy_from_slice(data), metadata)
                .await?;
            Ok(Document::stored(metadata, stored))
        }
    }
}
