//! Envelope assembly for the three transaction kinds.
//!
//! ```text
//! deploy:  RustArtifactSpec → Any → DeployTx ─┐
//! init:    RustArtifactSpec → Any ─┐           ├→ AnyTx{CallInfo, payload} → ExonumMessage
//!          Config value    → Any ─┴→ InitTx ──┤
//! custom:  request value ─────────────────────┘
//! ```
//!
//! Deploy and init are calls to the configuration service; a custom call
//! goes straight to the caller-named instance and method with the converted
//! request as its payload.

use prost::Message;

use super::messages::{
    exonum_message, Any, AnyTx, CallInfo, DeployTx, ExonumMessage, InitTx, RustArtifactSpec,
    Version,
};
use crate::config::{
    ACTIVATION_HEIGHT_IMMEDIATELY, CONFIGURATION_SERVICE_ID, DEPLOY_METHOD_ID, INIT_METHOD_ID,
    RUST_RUNTIME_ID,
};
use crate::convert::{encode_message, MessageValue};
use crate::error::Result;
use crate::schema::ServiceSchema;

/// Artifact identifier for the Rust runtime.
pub fn rust_artifact_spec(name: &str, version: &str) -> RustArtifactSpec {
    RustArtifactSpec {
        name: name.to_string(),
        version: Some(Version {
            data: version.to_string(),
        }),
    }
}

pub fn call_info(instance_id: u32, method_id: u32) -> CallInfo {
    CallInfo {
        instance_id,
        method_id,
    }
}

pub fn deploy_tx(
    runtime_id: u32,
    activation_height: u64,
    artifact_spec: &RustArtifactSpec,
) -> DeployTx {
    DeployTx {
        runtime_id,
        artifact_spec: Some(Any::pack(artifact_spec)),
        activation_height,
    }
}

pub fn init_tx(
    runtime_id: u32,
    artifact_spec: &RustArtifactSpec,
    instance_name: &str,
    constructor_data: Any,
) -> InitTx {
    InitTx {
        runtime_id,
        artifact_spec: Some(Any::pack(artifact_spec)),
        instance_name: instance_name.to_string(),
        constructor_data: Some(constructor_data),
    }
}

/// Wraps already-serialized request bytes for dispatch to `call_info`.
pub fn any_tx(call_info: CallInfo, payload: Vec<u8>) -> AnyTx {
    AnyTx {
        call_info: Some(call_info),
        payload,
    }
}

/// Wraps a call as the transaction variant of the top-level message.
pub fn exonum_message(any_tx: AnyTx) -> ExonumMessage {
    ExonumMessage {
        kind: Some(exonum_message::Kind::Transaction(any_tx)),
    }
}

// ---------------------------------------------------------------------------
// Per-kind assembly
// ---------------------------------------------------------------------------

/// Deploy envelope: Rust runtime, immediate activation, sent to the
/// configuration service's deploy method.
pub fn deploy_envelope(name: &str, version: &str) -> ExonumMessage {
    let spec = rust_artifact_spec(name, version);
    let deploy = deploy_tx(RUST_RUNTIME_ID, ACTIVATION_HEIGHT_IMMEDIATELY, &spec);
    let call = call_info(CONFIGURATION_SERVICE_ID, DEPLOY_METHOD_ID);
    exonum_message(any_tx(call, deploy.encode_to_vec()))
}

/// Init envelope: the converted service config travels as packed
/// constructor data.
pub fn init_envelope(
    name: &str,
    version: &str,
    instance_name: &str,
    schema: &ServiceSchema,
    config: &MessageValue,
) -> Result<ExonumMessage> {
    let spec = rust_artifact_spec(name, version);
    let constructor_data = Any::pack_dynamic(schema, config)?;
    let init = init_tx(RUST_RUNTIME_ID, &spec, instance_name, constructor_data);
    let call = call_info(CONFIGURATION_SERVICE_ID, INIT_METHOD_ID);
    Ok(exonum_message(any_tx(call, init.encode_to_vec())))
}

/// Custom-call envelope: the converted request is the payload itself.
pub fn custom_envelope(
    instance_id: u32,
    method_id: u32,
    request: &MessageValue,
) -> Result<ExonumMessage> {
    let call = call_info(instance_id, method_id);
    Ok(exonum_message(any_tx(call, encode_message(request)?)))
}
