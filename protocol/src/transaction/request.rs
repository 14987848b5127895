//! Request shapes accepted by the transaction factory.
//!
//! These are plain values handed over by the caller (CLI, launch file, web
//! front-end). Field names follow the launch-file format, so a request can
//! be deserialized directly from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// A deployable unit: name and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    pub version: String,
}

/// An artifact together with the schema module its service publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArtifact {
    pub name: String,
    pub version: String,
    pub module: String,
}

/// Artifact reference for a custom call; the version plays no part in
/// addressing an already-running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallArtifact {
    pub name: String,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub artifact: ArtifactSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    pub artifact: ServiceArtifact,
    pub instance_name: String,
    /// Constructor config; converted through the service's `Config` message.
    #[serde(default)]
    pub config: Map<String, Json>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRequest {
    pub artifact: CallArtifact,
    pub service_id: u32,
    pub method_id: u32,
    /// Name of the request message in the service's schema module.
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub data: Map<String, Json>,
}

/// Any of the three request kinds, tagged by `kind` in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionRequest {
    Deploy(DeployRequest),
    Init(InitRequest),
    Custom(CustomRequest),
}

impl TransactionRequest {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deploy(_) => "deploy",
            Self::Init(_) => "init",
            Self::Custom(_) => "custom",
        }
    }

    /// Artifact name the request concerns.
    pub fn artifact_name(&self) -> &str {
        match self {
            Self::Deploy(r) => &r.artifact.name,
            Self::Init(r) => &r.artifact.name,
            Self::Custom(r) => &r.artifact.name,
        }
    }
}

impl DeployRequest {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            artifact: ArtifactSpec {
                name: name.to_string(),
                version: version.to_string(),
            },
        }
    }
}
