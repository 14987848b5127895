// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Exonum Launcher: Core Library
//!
//! Builds and signs the transactions that deploy, start, and call services
//! on an Exonum blockchain, from untyped user input and schema modules
//! published by each service.
//!
//! ## Architecture
//!
//! The pipeline is split into modules along its stages:
//!
//! - **schema**: Loads and memoizes per-service message definitions.
//! - **convert**: Turns untyped JSON into schema-typed values and encodes them.
//! - **envelope**: Fixed wire messages and the nesting of a request inside them.
//! - **crypto**: Ed25519 keys and SHA-256.
//! - **transaction**: The factory tying the stages together, plus signing
//!   and inspection of signed transactions.
//! - **config**: Protocol constants and the launch-file model.
//! - **error**: The single error type every stage reports through.
//!
//! ## Design Philosophy
//!
//! 1. A build either yields a complete signed transaction or an error.
//!    Nothing partial escapes.
//! 2. The bytes that are signed are the bytes that are sent.
//! 3. Key material is borrowed for one build and never logged.

pub mod config;
pub mod convert;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod schema;
pub mod transaction;

pub use error::{LauncherError, Result};
pub use schema::SchemaRegistry;
pub use transaction::{SignedTransaction, TransactionFactory, TransactionRequest};
