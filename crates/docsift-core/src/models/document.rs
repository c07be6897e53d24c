use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::AnalysisResult;
use super::storage::{StorageMetadata, StoredObject};
use crate::StorageBackend;

/// Document metadata kept in the owning collection's list.
///
/// Exactly one of `storage_key` / `inline_content` is populated, determined by
/// `backend`; use [`Document::stored`] or [`Document::inline`] to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub display_name: String,
    pub content_type: String,
    pub byte_size: u64,
    pub backend: StorageBackend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    /// Base64-encoded content for the inline backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
    pub collection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_fallback: Option<bool>,
}

impl Document {
    /// Document whose content lives in an external backend.
    pub fn stored(metadata: &StorageMetadata, stored: StoredObject) -> Self {
        Self::base(metadata, stored.backend, Some(stored.storage_key), None)
    }

    /// Document whose content is embedded (base64) in the metadata.
    pub fn inline(metadata: &StorageMetadata, content_base64: String) -> Self {
        Self::base(metadata, StorageBackend::Inline, None, Some(content_base64))
    }

    fn base(
        metadata: &StorageMetadata,
        backend: StorageBackend,
        storage_key: Option<String>,
        inline_content: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: metadata.display_name.clone(),
            content_type: metadata.content_type.clone(),
            byte_size: metadata.byte_size,
            backend,
            storage_key,
            inline_content,
            created_at: Utc::now(),
            owner_id: metadata.owner_id.clone(),
            collection_id: metadata.collection_id.clone(),
            description: None,
            summary: None,
            analysis_fallback: None,
        }
    }

    pub fn with_analysis(mut self, analysis: &AnalysisResult) -> Self {
        self.description = Some(analysis.description.clone());
        self.summary = Some(analysis.summary.clone());
        self.analysis_fallback = Some(analysis.is_fallback);
        self
    }

    /// Whether the storage fields agree with the backend.
    pub fn is_consistent(&self) -> bool {
        match self.backend {
            StorageBackend::Inline => self.inline_content.is_some() && self.storage_key.is_none(),
            _ => self.storage_key.is_some() && self.inline_content.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> StorageMetadata {
        StorageMetadata {
            display_name: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            byte_size: 42,
            owner_id: "owner-1".to_string(),
            collection_id: "col-1".to_string(),
        }
    }

    #[test]
    fn test_stored_document_has_key_only() {
        let doc = Document::stored(
            &metadata(),
            StoredObject {
                storage_key: "k".to_string(),
                backend: StorageBackend::Relational,
                access_hint: None,
            },
        );
        assert!(doc.is_consistent());
        assert_eq!(doc.storage_key.as_deref(), Some("k"));
        assert!(doc.inline_content.is_none());
    }

    #[test]
    fn test_inline_document_has_content_only() {
        let doc = Document::inline(&metadata(), "aGVsbG8=".to_string());
        assert!(doc.is_consistent());
        assert_eq!(doc.backend, StorageBackend::Inline);
        assert!(doc.storage_key.is_none());
    }

    #[test]
    fn test_with_analysis() {
        let doc = Document::inline(&metadata(), String::new()).with_analysis(&AnalysisResult {
            description: "desc".to_string(),
            summary: "sum".to_string(),
            is_fallback: true,
        });
        assert_eq!(doc.description.as_deref(), Some("desc"));
        assert_eq!(doc.analysis_fallback, Some(true));
    }
}
