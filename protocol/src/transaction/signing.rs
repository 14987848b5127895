//! Transaction signing with Ed25519 keypairs.
//!
//! The `ExonumMessage` is serialized exactly once. Those bytes are what gets
//! signed and what gets embedded in the [`SignedMessage`], so the node sees
//! precisely the bytes the signature covers.

use prost::Message;

use crate::crypto::{sha256, Keypair, PublicKey, Signature};
use crate::envelope::messages::{self, ExonumMessage, SignedMessage};
use crate::error::Result;

/// A signed transaction ready for submission.
///
/// Holds the decoded [`SignedMessage`] alongside its serialized form; the
/// two always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    message: SignedMessage,
    bytes: Vec<u8>,
}

impl SignedTransaction {
    pub fn message(&self) -> &SignedMessage {
        &self.message
    }

    /// The serialized `ExonumMessage` the signature covers.
    pub fn payload(&self) -> &[u8] {
        &self.message.exonum_msg
    }

    /// Serialized `SignedMessage`, exactly what a node accepts.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Lowercase hex of [`Self::as_bytes`], the `tx_body` of the explorer API.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// SHA-256 of the serialized signed message.
    pub fn hash(&self) -> [u8; 32] {
        sha256(&self.bytes)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

/// Signs `message` with raw key bytes.
///
/// The secret key may be a 32-byte seed or a 64-byte expanded key; the
/// public key must be 32 bytes. Lengths and correspondence are checked
/// before anything is signed.
///
/// # Errors
///
/// [`LauncherError::InvalidKeyLength`](crate::error::LauncherError::InvalidKeyLength)
/// or [`LauncherError::KeypairMismatch`](crate::error::LauncherError::KeypairMismatch).
pub fn sign_message(
    message: &ExonumMessage,
    secret_key: &[u8],
    public_key: &[u8],
) -> Result<SignedTransaction> {
    let keypair = Keypair::from_parts(secret_key, public_key)?;
    Ok(sign_with_keypair(message, &keypair))
}

/// Signs `message` with an already validated keypair.
pub fn sign_with_keypair(message: &ExonumMessage, keypair: &Keypair) -> SignedTransaction {
    let exonum_msg = message.encode_to_vec();
    let signature = keypair.sign(&exonum_msg);
    seal(exonum_msg, &keypair.public_key(), &signature)
}

/// Assembles a `SignedMessage` from its parts without checking the
/// signature.
pub fn seal(exonum_msg: Vec<u8>, public_key: &PublicKey, signature: &Signature) -> SignedTransaction {
    let message = SignedMessage {
        exonum_msg,
        key: Some(messages::PublicKey {
            data: public_key.as_bytes().to_vec(),
        }),
        sign: Some(messages::Signature {
            data: signature.as_bytes().to_vec(),
        }),
    };
    let bytes = message.encode_to_vec();
    SignedTransaction { message, bytes }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
