//! Content hashing helpers.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// First `len` hex characters of the SHA-256 of `bytes`.
pub fn short_sha256_hex(bytes: &[u8], len: usize) -> String {
    let mut digest = sha256_hex(bytes);
    digest.truncate(len.min(digest.len()));
    digest
}
