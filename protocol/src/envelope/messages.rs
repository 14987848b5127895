//! Fixed wire messages of the platform protocol.
//!
//! These are the envelope layers every transaction passes through. Their
//! layout is fixed by the node, so they are declared statically with
//! `prost` rather than resolved through the schema registry.

/// Target of a call: service instance and method.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct CallInfo {
    #[prost(uint32, tag = "1")]
    pub instance_id: u32,
    #[prost(uint32, tag = "2")]
    pub method_id: u32,
}

/// A call with its serialized request. `payload` is opaque at this layer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AnyTx {
    #[prost(message, optional, tag = "1")]
    pub call_info: ::core::option::Option<CallInfo>,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}

/// Top-level tagged union of everything a node accepts as a signed message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExonumMessage {
    #[prost(oneof = "exonum_message::Kind", tags = "1")]
    pub kind: ::core::option::Option<exonum_message::Kind>,
}

pub mod exonum_message {
    /// The launcher only ever produces the transaction variant.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        Transaction(super::AnyTx),
    }
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct PublicKey {
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Signature {
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

/// Serialized `ExonumMessage` with the key and signature that authenticate
/// it. The signature covers `exonum_msg` exactly as stored.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub exonum_msg: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub key: ::core::option::Option<PublicKey>,
    #[prost(message, optional, tag = "3")]
    pub sign: ::core::option::Option<Signature>,
}

/// Semantic version of an artifact.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Version {
    #[prost(string, tag = "1")]
    pub data: ::prost::alloc::string::String,
}

/// Artifact identifier understood by the Rust runtime.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RustArtifactSpec {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub version: ::core::option::Option<Version>,
}

/// Type-tagged opaque payload.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

/// Request to the configuration service to register an artifact.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeployTx {
    #[prost(uint32, tag = "1")]
    pub runtime_id: u32,
    #[prost(message, optional, tag = "2")]
    pub artifact_spec: ::core::option::Option<Any>,
    #[prost(uint64, tag = "3")]
    pub activation_height: u64,
}

/// Request to the configuration service to start a service instance.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InitTx {
    #[prost(uint32, tag = "1")]
    pub runtime_id: u32,
    #[prost(message, optional, tag = "2")]
    pub artifact_spec: ::core::option::Option<Any>,
    #[prost(string, tag = "3")]
    pub instance_name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "4")]
    pub constructor_data: ::core::option::Option<Any>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn call_info_matches_reference_encoding() {
        let info = CallInfo {
            instance_id: 1,
            method_id: 3,
        };
        assert_eq!(info.encode_to_vec(), vec![0x08, 0x01, 0x10, 0x03]);
    }

    #[test]
    fn exonum_message_wraps_transaction_as_field_one() {
        let msg = ExonumMessage {
            kind: Some(exonum_message::Kind::Transaction(AnyTx {
                call_info: None,
                payload: vec![0xaa],
            })),
        };
        // field 1 (LD) -> AnyTx { field 2 (LD) -> [0xaa] }
        assert_eq!(msg.encode_to_vec(), vec![0x0a, 0x03, 0x12, 0x01, 0xaa]);
    }

    #[test]
    fn signed_message_decodes_back() {
        let signed = SignedMessage {
            exonum_msg: vec![1, 2, 3],
            key: Some(PublicKey { data: vec![7; 32] }),
            sign: Some(Signature { data: vec![9; 64] }),
        };
        let bytes = signed.encode_to_vec();
        assert_eq!(SignedMessage::decode(bytes.as_slice()).unwrap(), signed);
    }
}
