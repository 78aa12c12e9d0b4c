//! SHA-256 hashing helpers.

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

/// Compute SHA-256 of `data` and return it base64-encoded.
pub fn sha256_b64(data: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(data))
}

/// Compute SHA-256 of `data` and return it as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Deterministic one-way hash of a string.
///
/// Equal inputs always hash equal. Used to key cached and stored licenses
/// by context without keeping the context itself around.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher;

impl Hasher {
    /// Base64 SHA-256 of `input`.
    pub fn hash(input: &str) -> String {
        sha256_b64(input.as_bytes())
    }

    /// Hex SHA-256 of `input`, safe to use as a file name.
    pub fn hash_for_path(input: &str) -> String {
        sha256_hex(input.as_bytes())
    }
}
