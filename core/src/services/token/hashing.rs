//! One-way token hashing used for session lookups

use sha2::{Digest, Sha256};

/// Length of the hash prefix that may appear in logs
const LOG_PREFIX_LEN: usize = 12;

/// Deterministic, non-reversible token digest used only for equality lookups
pub trait TokenHasher: Send + Sync {
    fn hash(&self, token: &str) -> String;
}

/// SHA-256, hex encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256TokenHasher;

impl TokenHasher for Sha256TokenHasher {
    fn hash(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Short, log-safe form of a token hash
pub fn hash_prefix(hash: &str) -> &str {
    let end = hash.len().min(LOG_PREFIX_LEN);
    &hash[..end]
}
