//! # Envelope Builder
//!
//! Wire messages of the platform protocol and the functions that nest a
//! request inside them, layer by layer, up to the `ExonumMessage` that
//! gets signed.

pub mod any;
pub mod builder;
pub mod messages;

pub use any::TypedMessage;
pub use builder::{custom_envelope, deploy_envelope, init_envelope};
pub use messages::{
    exonum_message, Any, AnyTx, CallInfo, DeployTx, ExonumMessage, InitTx, RustArtifactSpec,
    SignedMessage, Version,
};
