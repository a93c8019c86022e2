//! # Hasher Module
//!
//! Content fingerprints for embedded images.
//!
//! An embedded image is identified by the SHA-256 of its bytes, rendered as
//! 64 lowercase hex characters. A [`ContentHasher`] keeps one digest state and
//! resets it after every call, so a worker can fingerprint thousands of
//! buffers without setting the algorithm up again.
//!
//! ## Example
//! ```rust,ignore
//! use image_data_aggregator::core::hasher::ContentHasher;
//!
//! let mut hasher = ContentHasher::new();
//! let a = hasher.digest(b"first buffer");
//! let b = hasher.digest(b"second buffer");
//! assert_ne!(a, b);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a rendered content hash in hex characters
pub const CONTENT_HASH_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 of a byte buffer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// The hex rendering
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reusable SHA-256 digest state
#[derive(Clone, Default)]
pub struct ContentHasher {
    state: Sha256,
}

impl ContentHasher {
    /// Create a hasher with fresh algorithm state
    pub fn new() -> Self {
        Self {
            state: Sha256::new(),
        }
    }

    /// Fingerprint `bytes`, leaving the hasher ready for the next buffer
    pub fn digest(&mut self, bytes: &[u8]) -> ContentHash {
        self.state.update(bytes);
        ContentHash(hex::encode(self.state.finalize_reset()))
    }
}

impl fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex_of_fixed_width() {
        let mut hasher = ContentHasher::new();
        let hash = hasher.digest(b"hello");

        assert_eq!(hash.as_str().len(), CONTENT_HASH_HEX_LEN);
        assert!(hash
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn digest_matches_known_vector() {
        let mut hasher = ContentHasher::new();
        assert_eq!(
            hasher.digest(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn reused_hasher_does_not_carry_state() {
        let mut reused = ContentHasher::new();
        let _ = reused.digest(b"some earlier buffer");
        let second = reused.digest(b"abc");

        let mut fresh = ContentHasher::new();
        assert_eq!(second, fresh.digest(b"abc"));
    }

    #[test]
    fn empty_buffer_hashes() {
        let mut hasher = ContentHasher::new();
        assert_eq!(
            hasher.digest(&[]).as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
