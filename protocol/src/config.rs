//! # Protocol Constants & Launch Configuration
//!
//! Every fixed identifier the launcher writes onto the wire lives here,
//! together with the serde model of a launch file. The constants mirror
//! values hard-wired into the node's built-in configuration service;
//! changing them produces transactions the node will reject.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::transaction::request::TransactionRequest;

// ---------------------------------------------------------------------------
// Built-in configuration service
// ---------------------------------------------------------------------------

/// Instance ID of the platform's configuration service. Deploy and init
/// requests are dispatched to it.
pub const CONFIGURATION_SERVICE_ID: u32 = 1;

/// Method of the configuration service that registers an artifact.
pub const DEPLOY_METHOD_ID: u32 = 3;

/// Method of the configuration service that starts a service instance.
pub const INIT_METHOD_ID: u32 = 4;

/// Combined deploy-and-init method. Reserved; the launcher always sends
/// the two steps separately.
pub const DEPLOY_INIT_METHOD_ID: u32 = 5;

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Identifier of the Rust runtime, the only runtime the launcher targets.
pub const RUST_RUNTIME_ID: u32 = 0;

/// Sentinel activation height meaning "activate immediately".
pub const ACTIVATION_HEIGHT_IMMEDIATELY: u64 = 0;

// ---------------------------------------------------------------------------
// Wire & schema conventions
// ---------------------------------------------------------------------------

/// Prefix of every type URL stored in a polymorphic container.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Fully-qualified name of the Rust runtime's artifact spec message.
pub const RUST_ARTIFACT_SPEC_TYPE: &str = "exonum.runtime.RustArtifactSpec";

/// File extension of schema modules on the search path.
pub const SCHEMA_FILE_EXTENSION: &str = "json";

/// Name of the message a service publishes as its constructor config.
pub const CONFIG_MESSAGE_NAME: &str = "Config";

/// Environment variable consulted for the schema search path.
pub const SCHEMA_PATH_ENV: &str = "EXONUM_LAUNCHER_SCHEMA_PATH";

/// Node endpoint accepting raw signed transactions.
pub const EXPLORER_TRANSACTIONS_PATH: &str = "/api/explorer/v1/transactions";

// ---------------------------------------------------------------------------
// Key & signature sizes
// ---------------------------------------------------------------------------

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 seed length in bytes.
pub const SECRET_SEED_LENGTH: usize = 32;

/// Expanded secret key length (seed followed by public key), as produced
/// by libsodium-style key generation.
pub const EXPANDED_SECRET_KEY_LENGTH: usize = 64;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Launch file
// ---------------------------------------------------------------------------

/// Connection parameters for the node the transactions are submitted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub hostname: String,
    pub public_api_port: u16,
    #[serde(default)]
    pub ssl: bool,
}

impl NodeConfig {
    /// Base URL of the node's public API, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.hostname, self.public_api_port)
    }

    /// Full URL of the raw-transaction submission endpoint.
    pub fn transactions_url(&self) -> String {
        format!("{}{}", self.base_url(), EXPLORER_TRANSACTIONS_PATH)
    }
}

/// A launch file: where to send transactions, where schemas live, and
/// which transactions to build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    pub exonum: NodeConfig,

    /// Root of the schema search path. Relative paths are resolved against
    /// the directory containing the launch file.
    #[serde(default)]
    pub schema_path: Option<PathBuf>,

    #[serde(default)]
    pub transactions: Vec<TransactionRequest>,
}

/// Errors raised while reading a launch file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read launch file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed launch file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LauncherConfig {
    /// Parses a launch file from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads and parses a launch file from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let (Some(schema_path), Some(parent)) = (config.schema_path.as_ref(), path.parent()) {
            if schema_path.is_relative() {
                config.schema_path = Some(parent.join(schema_path));
            }
        }
        Ok(config)
    }
}
