// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Exonum Launcher
//!
//! Entry point for the `exonum-launcher` binary. Parses CLI arguments,
//! initializes logging, obtains a signing keypair, and drives the
//! transaction factory.
//!
//! The binary supports five subcommands:
//!
//! - `keygen`: generate a keypair and write it to a key file
//! - `deploy`: build a deploy transaction
//! - `init`  : build an init transaction
//! - `call`  : build a custom call
//! - `launch`: build (and optionally submit) every transaction in a launch file
//!
//! Built transactions are printed to stdout as hex, one per line.

mod cli;
mod client;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use exonum_launcher::config::LauncherConfig;
use exonum_launcher::crypto::Keypair;
use exonum_launcher::schema::SchemaRegistry;
use exonum_launcher::transaction::{
    ArtifactSpec, CallArtifact, CustomRequest, DeployRequest, InitRequest, ServiceArtifact,
    SignedTransaction, TransactionFactory, TransactionRequest,
};

use cli::{Commands, KeyArgs, LauncherCli};
use client::NodeClient;
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LauncherCli::parse();
    logging::init_logging(
        "exonum_launcher=info,exonum_launcher_cli=info",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Keygen(args) => keygen(args),
        Commands::Deploy(args) => {
            let request = TransactionRequest::Deploy(DeployRequest {
                artifact: ArtifactSpec {
                    name: args.artifact,
                    version: args.artifact_version,
                },
            });
            build_one(cli.schema_path, &request, &args.keys)
        }
        Commands::Init(args) => {
            let request = TransactionRequest::Init(InitRequest {
                artifact: ServiceArtifact {
                    name: args.artifact,
                    version: args.artifact_version,
                    module: args.module,
                },
                instance_name: args.instance_name,
                config: parse_json_object(&args.config).context("invalid --config")?,
            });
            build_one(cli.schema_path, &request, &args.keys)
        }
        Commands::Call(args) => {
            let request = TransactionRequest::Custom(CustomRequest {
                artifact: CallArtifact {
                    name: args.artifact,
                    module: args.module,
                },
                service_id: args.service_id,
                method_id: args.method_id,
                message_type: args.message_type,
                data: parse_json_object(&args.data).context("invalid --data")?,
            });
            build_one(cli.schema_path, &request, &args.keys)
        }
        Commands::Launch(args) => launch(cli.schema_path, args).await,
    }
}

// ---------------------------------------------------------------------------
// Key files
// ---------------------------------------------------------------------------

/// On-disk keypair written by `keygen`. Both halves are hex.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    public_key: String,
    secret_key: String,
}

/// Generates a keypair and writes it to the requested key file.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            args.output.display()
        );
    }

    let keypair = Keypair::generate();
    let key_file = KeyFile {
        public_key: keypair.public_key().to_hex(),
        secret_key: keypair.secret_key_hex(),
    };
    let json = serde_json::to_string_pretty(&key_file)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("failed to write key file to {}", args.output.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&args.output, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!(
        public_key = %key_file.public_key,
        key_path = %args.output.display(),
        "keypair generated"
    );
    println!("{}", key_file.public_key);
    Ok(())
}

fn read_key_file(path: &Path) -> Result<Keypair> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    let key_file: KeyFile = serde_json::from_str(&raw)
        .with_context(|| format!("malformed key file {}", path.display()))?;

    let public = hex::decode(key_file.public_key.trim()).context("public key is not valid hex")?;
    let secret = hex::decode(key_file.secret_key.trim()).context("secret key is not valid hex")?;
    let keypair = Keypair::from_parts(&secret, &public)
        .with_context(|| format!("invalid keypair in {}", path.display()))?;
    Ok(keypair)
}

/// Resolves the signing keypair from the CLI flags.
fn load_keypair(keys: &KeyArgs) -> Result<Keypair> {
    match (&keys.key_file, keys.ephemeral_key) {
        (Some(path), _) => read_key_file(path),
        (None, true) => {
            let keypair = Keypair::generate();
            tracing::warn!(
                public_key = %keypair.public_key(),
                "signing with an ephemeral keypair"
            );
            Ok(keypair)
        }
        (None, false) => bail!("no signing key: pass --key-file or --ephemeral-key"),
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Registers every schema module on the search path up front, so builds
/// only ever look schemas up.
fn registry_for(schema_path: Option<PathBuf>) -> Result<SchemaRegistry> {
    let Some(root) = schema_path else {
        return Ok(SchemaRegistry::new());
    };
    let registry = SchemaRegistry::with_search_path(&root);
    registry
        .load_search_path()
        .with_context(|| format!("failed to load schemas from {}", root.display()))?;
    Ok(registry)
}

/// Parses a JSON object given inline or as `@path`.
fn parse_json_object(raw: &str) -> Result<Map<String, Json>> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?,
        None => raw.to_string(),
    };
    let value: Json = serde_json::from_str(&text)?;
    match value {
        Json::Object(map) => Ok(map),
        other => bail!("expected a JSON object, got {}", other),
    }
}

fn build(
    factory: &TransactionFactory<'_>,
    request: &TransactionRequest,
    keypair: &Keypair,
) -> Result<SignedTransaction> {
    let signed = factory.build(request, keypair).with_context(|| {
        format!(
            "failed to build {} transaction for `{}`",
            request.kind(),
            request.artifact_name()
        )
    })?;
    tracing::info!(
        kind = request.kind(),
        artifact = request.artifact_name(),
        hash = %signed.hash_hex(),
        "transaction built"
    );
    Ok(signed)
}

fn build_one(
    schema_path: Option<PathBuf>,
    request: &TransactionRequest,
    keys: &KeyArgs,
) -> Result<()> {
    let keypair = load_keypair(keys)?;
    let registry = registry_for(schema_path)?;
    let factory = TransactionFactory::new(&registry);

    let signed = build(&factory, request, &keypair)?;
    println!("{}", signed.to_hex());
    Ok(())
}

/// Builds every transaction of a launch file, in order, submitting each
/// one when requested. Stops at the first failure.
async fn launch(schema_path: Option<PathBuf>, args: cli::LaunchArgs) -> Result<()> {
    let config = LauncherConfig::from_file(&args.file)?;
    let keypair = load_keypair(&args.keys)?;
    let registry = registry_for(schema_path.or_else(|| config.schema_path.clone()))?;
    let factory = TransactionFactory::new(&registry);
    let node = if args.submit {
        let node = NodeClient::new(&config.exonum)?;
        tracing::debug!(url = %node.url(), "submitting to node");
        Some(node)
    } else {
        None
    };

    tracing::info!(
        file = %args.file.display(),
        transactions = config.transactions.len(),
        node = %config.exonum.base_url(),
        submit = args.submit,
        "launching"
    );

    for request in &config.transactions {
        let signed = build(&factory, request, &keypair)?;
        let tx_hex = signed.to_hex();
        println!("{}", tx_hex);

        if let Some(node) = &node {
            let response = node
                .submit(&tx_hex)
                .await
                .with_context(|| format!("failed to submit {} transaction", request.kind()))?;
            tracing::info!(
                status = response.status,
                response = %response.body.trim(),
                "transaction submitted"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        keygen(cli::KeygenArgs {
            output: path.clone(),
            force: false,
        })
        .unwrap();

        let keypair = read_key_file(&path).unwrap();
        let raw: KeyFile = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(keypair.public_key().to_hex(), raw.public_key);
    }

    #[test]
    fn keygen_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(&path, "{}").unwrap();

        let result = keygen(cli::KeygenArgs {
            output: path,
            force: false,
        });
        assert!(result.is_err());
    }

    #[test]
    fn missing_key_source_is_an_error() {
        let keys = KeyArgs {
            key_file: None,
            ephemeral_key: false,
        };
        assert!(load_keypair(&keys).is_err());
    }

    #[test]
    fn json_object_arguments() {
        let map = parse_json_object(r#"{ "max_balance": 1000 }"#).unwrap();
        assert_eq!(map["max_balance"], serde_json::json!(1000));
        assert!(parse_json_object("[1, 2]").is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "name": "alice" }"#).unwrap();
        let map = parse_json_object(&format!("@{}", path.display())).unwrap();
        assert_eq!(map["name"], serde_json::json!("alice"));
    }
}
