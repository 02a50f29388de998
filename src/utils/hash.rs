//! Content hashing for stable document identifiers.

use sha2::{Digest, Sha256};

/// Number of hex characters of the content hash kept in a document ID.
pub const DOCUMENT_ID_HASH_LEN: usize = 12;

/// Compute the hex-encoded SHA-256 hash of content.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Build a document ID from the source name and a content hash prefix.
///
/// Independent of time, so identical input always yields the same ID.
pub fn document_id(source_name: &str, content: &[u8]) -> String {
    let hash = compute_hash(content);
    format!("{}_{}", source_name, &hash[..DOCUMENT_ID_HASH_LEN])
}
