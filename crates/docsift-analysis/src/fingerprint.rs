use sha2::{Digest, Sha256};

/// Stable content identity: SHA-256 of the raw bytes as 64 lowercase hex chars.
pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
