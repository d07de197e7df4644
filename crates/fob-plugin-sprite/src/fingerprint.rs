//! Content fingerprinting for the emitted sprite.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Number of hex characters kept from the digest
pub const HASH_LENGTH: usize = 8;

/// Hex-encoded SHA-256 of `data` (64 characters).
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// First [`HASH_LENGTH`] characters of the content hash
pub fn short_hash(data: &[u8]) -> String {
    let mut hash = content_hash(data);
    hash.truncate(HASH_LENGTH);
    hash
}

/// `[stem]-[hash].[ext]`
///
/// Example: `sprite.svg` with hash `abcd1234` → `sprite-abcd1234.svg`
pub fn hashed_file_name(file_name: &str, hash: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    if ext.is_empty() {
        format!("{}-{}", stem, hash)
    } else {
        format!("{}-{}.{}", stem, hash, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash_is_digest_prefix() {
        let full = content_hash(b"<svg/>");
        assert_eq!(full.len(), 64);
        assert_eq!(short_hash(b"<svg/>"), full[..8]);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hashed_file_name() {
        assert_eq!(hashed_file_name("sprite.svg", "abcd1234"), "sprite-abcd1234.svg");
        assert_eq!(hashed_file_name("icons", "abcd1234"), "icons-abcd1234");
    }
}
