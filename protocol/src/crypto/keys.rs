//! # Key Management
//!
//! Ed25519 key material for signing launcher transactions.
//!
//! Keys reach the pipeline as raw byte slices supplied by the caller. This
//! module validates their lengths, checks that the secret half derives the
//! public half, and wraps them in types that never print secret bytes.
//!
//! ## Accepted secret key layouts
//!
//! - 32 bytes: the Ed25519 seed.
//! - 64 bytes: seed followed by the public key (libsodium layout). The
//!   trailing half must equal the derived public key.
//!
//! Private keys are zeroized on drop by `ed25519-dalek`. Key bytes are
//! never logged.

use std::fmt;

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::config::{
    EXPANDED_SECRET_KEY_LENGTH, PUBLIC_KEY_LENGTH, SECRET_SEED_LENGTH, SIGNATURE_LENGTH,
};
use crate::error::{LauncherError, Result};

/// An Ed25519 signing keypair.
///
/// `Keypair` does not implement `Serialize`. Export secret material with
/// [`Keypair::secret_key_hex`] when a caller genuinely needs to persist it.
///
/// # Examples
///
/// ```
/// use exonum_launcher::crypto::Keypair;
///
/// let kp = Keypair::generate();
/// let sig = kp.sign(b"deploy cryptocurrency");
/// assert!(kp.public_key().verify(b"deploy cryptocurrency", &sig));
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of a keypair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// A detached Ed25519 signature. Always 64 bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl Keypair {
    /// Generates a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Builds a keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Builds a keypair from a 32-byte seed or a 64-byte expanded key.
    ///
    /// Any other length fails with [`LauncherError::InvalidKeyLength`]. For
    /// the expanded layout the trailing 32 bytes must match the derived
    /// public key.
    pub fn from_secret_slice(secret: &[u8]) -> Result<Self> {
        match secret.len() {
            SECRET_SEED_LENGTH => {
                let mut seed = [0u8; SECRET_SEED_LENGTH];
                seed.copy_from_slice(secret);
                Ok(Self::from_seed(&seed))
            }
            EXPANDED_SECRET_KEY_LENGTH => {
                let (seed_part, public_part) = secret.split_at(SECRET_SEED_LENGTH);
                let mut seed = [0u8; SECRET_SEED_LENGTH];
                seed.copy_from_slice(seed_part);
                let keypair = Self::from_seed(&seed);
                if keypair.public_key().as_bytes()[..] != public_part[..] {
                    return Err(LauncherError::KeypairMismatch);
                }
                Ok(keypair)
            }
            actual => Err(LauncherError::InvalidKeyLength {
                what: "secret key",
                expected: "32 or 64",
                actual,
            }),
        }
    }

    /// Builds a keypair from raw secret and public key bytes, checking that
    /// both have valid lengths and belong together.
    pub fn from_parts(secret: &[u8], public: &[u8]) -> Result<Self> {
        let public = PublicKey::from_slice(public)?;
        let keypair = Self::from_secret_slice(secret)?;
        if keypair.public_key() != public {
            return Err(LauncherError::KeypairMismatch);
        }
        Ok(keypair)
    }

    /// Parses a hex-encoded secret key (seed or expanded layout).
    pub fn from_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex.trim()).map_err(|e| LauncherError::Decode {
            context: "secret key".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_secret_slice(&bytes)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Signs arbitrary bytes. Ed25519 is deterministic: the same key and
    /// message always give the same signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Hex-encoded 64-byte expanded secret key (seed followed by public key).
    ///
    /// Handle with care: this is the whole identity.
    pub fn secret_key_hex(&self) -> String {
        let mut expanded = Vec::with_capacity(EXPANDED_SECRET_KEY_LENGTH);
        expanded.extend_from_slice(&self.signing_key.to_bytes());
        expanded.extend_from_slice(self.public_key().as_bytes());
        hex::encode(expanded)
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Validates the length of a raw public key.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != PUBLIC_KEY_LENGTH {
            return Err(LauncherError::InvalidKeyLength {
                what: "public key",
                expected: "32",
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Verifies a signature over `message`. Any malformed input simply
    /// yields `false`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &sig).is_ok()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Parses a signature of exactly 64 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            slice
                .try_into()
                .map_err(|_| LauncherError::InvalidKeyLength {
                    what: "signature",
                    expected: "64",
                    actual: slice.len(),
                })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"deploy");
        assert!(kp.public_key().verify(b"deploy", &sig));
        assert!(!kp.public_key().verify(b"init", &sig));
    }

    #[test]
    fn seed_and_expanded_layouts_agree() {
        let kp = Keypair::from_seed(&[7u8; 32]);
        let expanded = hex::decode(kp.secret_key_hex()).unwrap();
        assert_eq!(expanded.len(), 64);

        let restored = Keypair::from_secret_slice(&expanded).unwrap();
        assert_eq!(restored.public_key(), kp.public_key());

        let from_seed = Keypair::from_secret_slice(&expanded[..32]).unwrap();
        assert_eq!(from_seed.public_key(), kp.public_key());
    }

    #[test]
    fn wrong_secret_length_is_rejected() {
        let err = Keypair::from_secret_slice(&[1u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            LauncherError::InvalidKeyLength { actual: 31, .. }
        ));
    }

    #[test]
    fn wrong_public_length_is_rejected() {
        let err = PublicKey::from_slice(&[1u8; 33]).unwrap_err();
        assert!(matches!(
            err,
            LauncherError::InvalidKeyLength {
                what: "public key",
                actual: 33,
                ..
            }
        ));
    }

    #[test]
    fn expanded_key_with_foreign_public_half_is_rejected() {
        let kp = Keypair::from_seed(&[1u8; 32]);
        let other = Keypair::from_seed(&[2u8; 32]);
        let mut expanded = vec![1u8; 32];
        expanded.extend_from_slice(other.public_key().as_bytes());

        let err = Keypair::from_secret_slice(&expanded).unwrap_err();
        assert!(matches!(err, LauncherError::KeypairMismatch));
        assert_ne!(kp.public_key(), other.public_key());
    }

    #[test]
    fn from_parts_requires_matching_keys() {
        let kp = Keypair::from_seed(&[3u8; 32]);
        let other = Keypair::from_seed(&[4u8; 32]);
        let seed = [3u8; 32];

        assert!(Keypair::from_parts(&seed, kp.public_key().as_bytes()).is_ok());
        assert!(matches!(
            Keypair::from_parts(&seed, other.public_key().as_bytes()),
            Err(LauncherError::KeypairMismatch)
        ));
    }

    #[test]
    fn debug_output_hides_secret() {
        let kp = Keypair::from_seed(&[9u8; 32]);
        let debug = format!("{:?}", kp);
        assert!(debug.contains(&kp.public_key().to_hex()));
        assert!(!debug.contains(&hex::encode([9u8; 32])));
    }

    #[test]
    fn hex_import_accepts_whitespace() {
        let kp = Keypair::from_seed(&[5u8; 32]);
        let text = format!("  {}\n", kp.secret_key_hex());
        assert_eq!(Keypair::from_hex(&text).unwrap().public_key(), kp.public_key());
    }
}
