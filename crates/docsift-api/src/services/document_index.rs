//! Per-collection document metadata kept in the shared key/value store.

use std::sync::Arc;

use docsift_core::models::Document;
use docsift_infra::{KeyValueStore, KvError};
use uuid::Uuid;

pub fn index_key(collection_id: &str) -> String {
    format!("documents:{}", collection_id)
}

/// A document together with its stored JSON, needed to remove it again.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub document: Document,
    raw: String,
}

/// Newest-first list per collection, bounded to `max_len` entries. Entries
/// evicted by the bound lose their metadata only; backend content is left in place.
#[derive(Clone)]
pub struct DocumentIndex {
    store: Arc<dyn KeyValueStore>,
    max_len: usize,
}

impl DocumentIndex {
    pub fn new(store: Arc<dyn KeyValueStore>, max_len: usize) -> Self {
        Self { store, max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[tracing::instrument(skip(self, document), fields(kv.key = %index_key(&document.collection_id), document_id = %document.id))]
    pub async fn insert(&self, document: &Document) -> Result<(), KvError> {
        if !document.is_consistent() {
            return Err(KvError::InvalidValue {
                key: index_key(&document.collection_id),
                message: format!(
                    "document {} has storage fields that do not match the {} backend",
                    document.id, document.backend
                ),
            });
        }
        let raw = serde_json::to_string(document).map_err(|e| KvError::InvalidValue {
            key: index_key(&document.collection_id),
            message: e.to_string(),
        })?;
        self.store
            .list_push(&index_key(&document.collection_id), &raw, self.max_len)
            .await
    }

    async fn entries(&self, collection_id: &str) -> Result<Vec<IndexedDocument>, KvError> {
        let key = index_key(collection_id);
        let raw_entries = self.store.list_range(&key, self.max_len).await?;

        Ok(raw_entries
            .into_iter()
            .filter_map(|raw| match serde_json::from_str::<Document>(&raw) {
                Ok(document) if document.is_consistent() => {
                    Some(IndexedDocument { document, raw })
                }
                Ok(document) => {
                    tracing::warn!(
                        document_id = %document.id,
                        key = %key,
                        "Skipping inconsistent document entry"
                    );
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Skipping corrupt document entry");
                    None
                }
            })
            .collect())
    }

    /// Documents in `collection_id`, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, collection_id: &str) -> Result<Vec<Document>, KvError> {
        Ok(self
            .entries(collection_id)
            .await?
            .into_iter()
            .map(|entry| entry.document)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn find(
        &self,
        collection_id: &str,
        id: Uuid,
    ) -> Result<Option<IndexedDocument>, KvError> {
        Ok(self
            .entries(collection_id)
            .await?
            .into_iter()
            .find(|entry| entry.document.id == id))
    }

    /// Remove an entry previously returned by [`DocumentIndex::find`].
    #[tracing::instrument(skip(self, entry), fields(document_id = %entry.document.id))]
    pub async fn remove(&self, entry: &IndexedDocument) -> Result<bool, KvError> {
        let removed = self
            .store
            .list_remove(&index_key(&entry.document.collection_id), &entry.raw)
            .await?;
        Ok(removed > 0)
    }
}
