//! # Cryptographic Primitives
//!
//! Thin, type-safe wrappers around audited implementations:
//!
//! - **Ed25519** (`ed25519-dalek`) for transaction signatures.
//! - **SHA-256** (`sha2`) for transaction hashes.

pub mod hash;
pub mod keys;

pub use hash::sha256;
pub use keys::{Keypair, PublicKey, Signature};
