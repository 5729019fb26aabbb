//! Hashing utilities for cache addressing.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes.
///
/// Returns the full 64-character lowercase hex SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}
