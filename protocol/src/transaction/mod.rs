//! # Transaction Module
//!
//! Builds, signs, and inspects launcher transactions.
//!
//! ## Architecture
//!
//! ```text
//! request.rs     : Request shapes for deploy, init, and custom calls
//! factory.rs     : TransactionFactory: schema → convert → envelope → sign
//! signing.rs     : Ed25519 signing of a serialized ExonumMessage
//! verification.rs: Parsing and signature checks of signed transactions
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Request**: The caller supplies a [`TransactionRequest`] and a keypair.
//! 2. **Build**: [`TransactionFactory`] resolves the schema, converts the
//!    input, and assembles the envelope.
//! 3. **Sign**: The envelope is serialized once and signed.
//! 4. **Submit**: The caller posts [`SignedTransaction::to_hex`] to a node.

pub mod factory;
pub mod request;
pub mod signing;
pub mod verification;

pub use factory::TransactionFactory;
pub use request::{
    ArtifactSpec, CallArtifact, CustomRequest, DeployRequest, InitRequest, ServiceArtifact,
    TransactionRequest,
};
pub use signing::{sign_message, sign_with_keypair, SignedTransaction};
pub use verification::{parse_signed_transaction, ParsedTransaction};
