//! Parsing and verification of signed transactions.
//!
//! The inverse of the build pipeline, used for inspection and in tests:
//! decode the `SignedMessage`, check the signature against the embedded
//! bytes, then unwrap the `ExonumMessage` down to the call it carries.
//! Checks run cheapest first; nothing below the signature is decoded until
//! the signature holds.

use prost::Message;

use crate::config::{CONFIGURATION_SERVICE_ID, DEPLOY_METHOD_ID, INIT_METHOD_ID};
use crate::convert::MessageValue;
use crate::crypto::{PublicKey, Signature};
use crate::envelope::messages::{exonum_message, AnyTx, CallInfo, DeployTx, ExonumMessage, InitTx};
use crate::envelope::RustArtifactSpec;
use crate::error::{LauncherError, Result};
use crate::schema::ServiceSchema;

/// A signed transaction that passed signature verification.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub public_key: PublicKey,
    pub signature: Signature,
    pub call_info: CallInfo,
    /// Serialized request addressed to `call_info`.
    pub payload: Vec<u8>,
}

impl ParsedTransaction {
    pub fn is_deploy(&self) -> bool {
        self.call_info.instance_id == CONFIGURATION_SERVICE_ID
            && self.call_info.method_id == DEPLOY_METHOD_ID
    }

    pub fn is_init(&self) -> bool {
        self.call_info.instance_id == CONFIGURATION_SERVICE_ID
            && self.call_info.method_id == INIT_METHOD_ID
    }

    pub fn deploy_tx(&self) -> Result<DeployTx> {
        DeployTx::decode(self.payload.as_slice()).map_err(|e| LauncherError::decode("DeployTx", e))
    }

    pub fn init_tx(&self) -> Result<InitTx> {
        InitTx::decode(self.payload.as_slice()).map_err(|e| LauncherError::decode("InitTx", e))
    }

    /// Artifact carried by a deploy or init payload.
    pub fn artifact_spec(&self) -> Result<RustArtifactSpec> {
        let packed = if self.is_init() {
            self.init_tx()?.artifact_spec
        } else {
            self.deploy_tx()?.artifact_spec
        };
        packed
            .ok_or_else(|| LauncherError::decode("artifact_spec", "field is absent"))?
            .unpack()
    }

    /// Constructor config of an init payload, decoded through `schema`.
    pub fn init_config(&self, schema: &ServiceSchema) -> Result<MessageValue> {
        self.init_tx()?
            .constructor_data
            .ok_or_else(|| LauncherError::decode("constructor_data", "field is absent"))?
            .unpack_dynamic(schema)
    }
}

/// Decodes a serialized `SignedMessage`, verifies its signature, and
/// returns the call it carries.
///
/// # Errors
///
/// - [`LauncherError::Decode`] for malformed bytes at any layer.
/// - [`LauncherError::InvalidKeyLength`] for a key or signature of the
///   wrong size.
/// - [`LauncherError::InvalidSignature`] if the signature does not cover
///   the embedded bytes.
pub fn parse_signed_transaction(bytes: &[u8]) -> Result<ParsedTransaction> {
    let signed = crate::envelope::SignedMessage::decode(bytes)
        .map_err(|e| LauncherError::decode("SignedMessage", e))?;

    let key = signed
        .key
        .as_ref()
        .ok_or_else(|| LauncherError::decode("SignedMessage.key", "field is absent"))?;
    let sign = signed
        .sign
        .as_ref()
        .ok_or_else(|| LauncherError::decode("SignedMessage.sign", "field is absent"))?;

    let public_key = PublicKey::from_slice(&key.data)?;
    let signature = Signature::from_slice(&sign.data)?;
    if !public_key.verify(&signed.exonum_msg, &signature) {
        return Err(LauncherError::InvalidSignature);
    }

    let AnyTx {
        call_info,
        payload,
    } = unwrap_transaction(&signed.exonum_msg)?;
    let call_info =
        call_info.ok_or_else(|| LauncherError::decode("AnyTx.call_info", "field is absent"))?;

    Ok(ParsedTransaction {
        public_key,
        signature,
        call_info,
        payload,
    })
}

fn unwrap_transaction(exonum_msg: &[u8]) -> Result<AnyTx> {
    let message =
        ExonumMessage::decode(exonum_msg).map_err(|e| LauncherError::decode("ExonumMessage", e))?;
    match message.kind {
        Some(exonum_message::Kind::Transaction(tx)) => Ok(tx),
        None => Err(LauncherError::decode(
            "ExonumMessage",
            "message carries no transaction",
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::envelope::{deploy_envelope, SignedMessage};
    use crate::transaction::signing::{seal, sign_with_keypair};

    fn signed_deploy() -> (Keypair, Vec<u8>) {
        let kp = Keypair::from_seed(&[3u8; 32]);
        let signed = sign_with_keypair(&deploy_envelope("cryptocurrency", "1.0.0"), &kp);
        (kp, signed.into_bytes())
    }

    #[test]
    fn parses_valid_deploy() {
        let (kp, bytes) = signed_deploy();
        let parsed = parse_signed_transaction(&bytes).unwrap();

        assert_eq!(parsed.public_key, kp.public_key());
        assert!(parsed.is_deploy());
        assert!(!parsed.is_init());
        let spec = parsed.artifact_spec().unwrap();
        assert_eq!(spec.name, "cryptocurrency");
        assert_eq!(spec.version.unwrap().data, "1.0.0");
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let (_, bytes) = signed_deploy();
        let mut signed = SignedMessage::decode(bytes.as_slice()).unwrap();
        let last = signed.exonum_msg.len() - 1;
        signed.exonum_msg[last] ^= 0x01;

        let err = parse_signed_transaction(&signed.encode_to_vec()).unwrap_err();
        assert!(matches!(err, LauncherError::InvalidSignature));
    }

    #[test]
    fn foreign_key_fails_verification() {
        let (_, bytes) = signed_deploy();
        let signed = SignedMessage::decode(bytes.as_slice()).unwrap();
        let sig = Signature::from_slice(&signed.sign.unwrap().data).unwrap();
        let other = Keypair::from_seed(&[4u8; 32]).public_key();

        let forged = seal(signed.exonum_msg, &other, &sig);
        assert!(matches!(
            parse_signed_transaction(forged.as_bytes()),
            Err(LauncherError::InvalidSignature)
        ));
    }

    #[test]
    fn missing_signature_is_a_decode_error() {
        let (_, bytes) = signed_deploy();
        let mut signed = SignedMessage::decode(bytes.as_slice()).unwrap();
        signed.sign = None;
        assert!(matches!(
            parse_signed_transaction(&signed.encode_to_vec()),
            Err(LauncherError::Decode { .. })
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            parse_signed_transaction(&[0xff, 0xff, 0xff]),
            Err(LauncherError::Decode { .. })
        ));
    }
}
