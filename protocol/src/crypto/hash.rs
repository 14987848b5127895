//! # Hashing Utilities
//!
//! The ledger identifies a transaction by the SHA-256 digest of its signed
//! bytes. That is the only hash the launcher needs.

use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest in bytes.
pub const HASH_LENGTH: usize = 32;

/// SHA-256 of `data` as a fixed-size array.
///
/// # Example
///
/// ```
/// use exonum_launcher::crypto::sha256;
///
/// assert_eq!(sha256(b"exonum").len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc"), FIPS 180-2 appendix B.1.
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_is_sensitive_to_single_byte() {
        assert_ne!(sha256(b"payload-a"), sha256(b"payload-b"));
    }
}
