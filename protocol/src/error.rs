//! Error types for the transaction pipeline.
//!
//! Every stage of the pipeline fails synchronously with a [`LauncherError`]
//! at the point where the violation is detected. Nothing is retried and
//! nothing is absorbed: a build either produces a complete signed
//! transaction or one of these.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving schemas, converting values,
/// building envelopes, or signing.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// No schema module is registered (or loadable) for the pair.
    #[error("schema not found for service `{service}`, module `{module}`")]
    SchemaNotFound {
        /// Artifact (service) name used for the lookup.
        service: String,
        /// Schema module name used for the lookup.
        module: String,
    },

    /// The resolved schema module does not publish the named message.
    #[error("message `{message}` not found in schema `{service}/{module}`")]
    MessageNotFound {
        service: String,
        module: String,
        message: String,
    },

    /// The untyped input does not fit the message definition.
    #[error("schema mismatch at `{path}`: {reason}")]
    SchemaMismatch {
        /// Dotted field path, with array indices, of the offending value.
        path: String,
        reason: String,
    },

    /// Key material has the wrong length. Raised before any signing happens.
    #[error("invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        what: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// The secret key does not derive the supplied public key.
    #[error("keypair mismatch: secret key does not correspond to public key")]
    KeypairMismatch,

    /// A schema module was found but is structurally invalid.
    #[error("invalid schema `{origin}`: {reason}")]
    InvalidSchema { origin: String, reason: String },

    /// The schema search path or one of its files could not be read.
    #[error("failed to read schema from {}: {source}", path.display())]
    SchemaIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes could not be parsed back through the expected schema.
    #[error("decode error in `{context}`: {reason}")]
    Decode { context: String, reason: String },

    /// A polymorphic container holds a different type than requested.
    #[error("unexpected type URL: expected `{expected}`, got `{actual}`")]
    UnexpectedTypeUrl { expected: String, actual: String },

    /// The signature embedded in a signed transaction does not verify.
    #[error("signature verification failed")]
    InvalidSignature,
}

impl LauncherError {
    pub(crate) fn mismatch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = LauncherError> = std::result::Result<T, E>;
