//! # Hashing Utilities
//!
//! TransactID signs hex digests, not raw bytes. Every signature in the
//! protocol (owner attestations, sender signatures, the encrypted envelope)
//! is computed over the UTF-8 bytes of a lowercase SHA-256 hex string of the
//! canonical encoding. That detour through hex is part of the wire contract:
//! peers that sign the raw digest instead produce signatures nobody else
//! can verify.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of `data`, rendered as 64 lowercase hex characters.
///
/// # Example
///
/// ```
/// use transactid_protocol::crypto::hash256;
///
/// assert_eq!(
///     hash256(b"abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub fn hash256(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// [`hash256`] over the UTF-8 bytes of a string.
pub fn hash256_str(data: &str) -> String {
    hash256(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash256_known_vector() {
        assert_eq!(
            hash256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash256_is_lowercase_hex() {
        let digest = hash256(b"transactid");
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_hash256_str_matches_bytes() {
        assert_eq!(hash256_str("memo"), hash256(b"memo"));
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(sha256(b"same input"), sha256(b"same input"));
        assert_ne!(sha256(b"input a"), sha256(b"input b"));
    }
}
