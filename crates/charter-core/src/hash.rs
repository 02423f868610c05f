//! Content hashing for duplicate detection and download integrity.

use sha2::{Digest, Sha256};

/// SHA-256 of `bytes` as lowercase hex.
///
/// Deterministic and context-free: identical bytes always produce the same
/// digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn digest_is_stable() {
    assert_eq!(sha256_hex(b"hello"), sha256_hex(b"hello"));
  }

  #[test]
  fn known_vector() {
    assert_eq!(
      sha256_hex(b""),
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }

  #[test]
  fn distinct_content_distinct_digest() {
    assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
  }
}
