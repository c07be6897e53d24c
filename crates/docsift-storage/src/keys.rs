//! Storage key generation for the object store.
//!
//! Key format: `documents/{owner}/{collection}/{YYYYMMDDTHHMMSS}/{random}/{filename}`.
//! Every segment is sanitized, so keys never contain `..` or a leading `/`.

use chrono::{DateTime, Utc};
use docsift_core::models::StorageMetadata;
use uuid::Uuid;

const MAX_SEGMENT_CHARS: usize = 128;
const MAX_FILENAME_CHARS: usize = 200;

fn sanitize(value: &str, max_chars: usize, fallback: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(max_chars)
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Reduce a display name to a safe final key segment.
pub fn sanitize_filename(name: &str) -> String {
    // Only the last path component of an uploaded name is meaningful.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    sanitize(base, MAX_FILENAME_CHARS, "file")
}

pub fn generate_object_key(metadata: &StorageMetadata, now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "documents/{}/{}/{}/{}/{}",
        sanitize(&metadata.owner_id, MAX_SEGMENT_CHARS, "unknown"),
        sanitize(&metadata.collection_id, MAX_SEGMENT_CHARS, "unknown"),
        now.format("%Y%m%dT%H%M%S"),
        &random[..16],
        sanitize_filename(&metadata.display_name)
    )
}
