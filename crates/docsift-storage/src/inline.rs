use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::traits::{StorageError, StorageResult};

/// Inline mode: content travels base64-encoded inside the document metadata.
#[derive(Debug, Clone, Copy)]
pub struct InlineStorage {
    max_bytes: usize,
}

impl InlineStorage {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn encode(&self, data: &[u8]) -> StorageResult<String> {
        if data.len() > self.max_bytes {
            return Err(StorageError::SizeLimitExceeded {
                size: data.len() as u64,
                limit: self.max_bytes as u64,
            });
        }
        Ok(STANDARD.encode(data))
    }
}
