use crate::StorageBackend;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metadata supplied with every upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageMetadata {
    pub display_name: String,
    pub content_type: String,
    pub byte_size: u64,
    pub owner_id: String,
    pub collection_id: String,
}

/// Result of a successful upload. `storage_key` together with `backend` is the
/// only handle needed to retrieve or delete the content later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub storage_key: String,
    pub backend: StorageBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_hint: Option<String>,
}

/// A URL (or endpoint) granting read access to stored content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUrl {
    pub url: String,
    /// `None` when the URL does not expire (e.g. the streaming endpoint).
    pub expires_in: Option<Duration>,
}
