//! # CLI Interface
//!
//! Defines the command-line argument structure for `exonum-launcher` using
//! `clap` derive. Supports five subcommands: `keygen`, `deploy`, `init`,
//! `call`, and `launch`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Exonum service launcher.
///
/// Builds signed deploy, init, and custom-call transactions from schema
/// modules published by each service, and optionally submits them to a
/// node.
#[derive(Parser, Debug)]
#[command(
    name = "exonum-launcher",
    about = "Build and submit Exonum service transactions",
    version,
    propagate_version = true
)]
pub struct LauncherCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "EXONUM_LAUNCHER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Root of the schema search path (`<root>/<service>/<module>.json`).
    ///
    /// Overrides `schema_path` from a launch file.
    #[arg(long, global = true, env = "EXONUM_LAUNCHER_SCHEMA_PATH")]
    pub schema_path: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an Ed25519 keypair and write it to a key file.
    Keygen(KeygenArgs),
    /// Build a deploy transaction and print it as hex.
    Deploy(DeployArgs),
    /// Build an init transaction and print it as hex.
    Init(InitArgs),
    /// Build a custom call and print it as hex.
    Call(CallArgs),
    /// Build every transaction in a launch file, optionally submitting them.
    Launch(LaunchArgs),
}

/// Where the signing keypair comes from.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Path to a key file written by `keygen`.
    #[arg(long, short = 'k', env = "EXONUM_LAUNCHER_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Sign with a freshly generated throwaway keypair.
    ///
    /// Only meaningful against nodes that accept any signer.
    #[arg(long, conflicts_with = "key_file")]
    pub ephemeral_key: bool,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Output path of the key file.
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `deploy` subcommand.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// Artifact name.
    #[arg(long)]
    pub artifact: String,

    /// Artifact version.
    #[arg(long = "artifact-version")]
    pub artifact_version: String,

    #[command(flatten)]
    pub keys: KeyArgs,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Artifact name.
    #[arg(long)]
    pub artifact: String,

    /// Artifact version.
    #[arg(long = "artifact-version")]
    pub artifact_version: String,

    /// Schema module holding the service's `Config` message.
    #[arg(long, default_value = "service")]
    pub module: String,

    /// Name of the new service instance.
    #[arg(long)]
    pub instance_name: String,

    /// Constructor config as a JSON object, or `@path` to read it from a file.
    #[arg(long, default_value = "{}")]
    pub config: String,

    #[command(flatten)]
    pub keys: KeyArgs,
}

/// Arguments for the `call` subcommand.
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Artifact name the schema module belongs to.
    #[arg(long)]
    pub artifact: String,

    /// Schema module holding the request message.
    #[arg(long, default_value = "service")]
    pub module: String,

    /// Numeric ID of the running service instance.
    #[arg(long)]
    pub service_id: u32,

    /// Method ID within the service.
    #[arg(long)]
    pub method_id: u32,

    /// Request message name.
    #[arg(long = "type")]
    pub message_type: String,

    /// Request fields as a JSON object, or `@path` to read them from a file.
    #[arg(long, default_value = "{}")]
    pub data: String,

    #[command(flatten)]
    pub keys: KeyArgs,
}

/// Arguments for the `launch` subcommand.
#[derive(Parser, Debug)]
pub struct LaunchArgs {
    /// Path to the launch file (JSON).
    pub file: PathBuf,

    /// POST each transaction to the node named in the launch file.
    #[arg(long)]
    pub submit: bool,

    #[command(flatten)]
    pub keys: KeyArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        LauncherCli::command().debug_assert();
    }

    #[test]
    fn key_file_and_ephemeral_key_conflict() {
        let parsed = LauncherCli::try_parse_from([
            "exonum-launcher",
            "deploy",
            "--artifact",
            "cryptocurrency",
            "--artifact-version",
            "1.0.0",
            "--key-file",
            "keys.json",
            "--ephemeral-key",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn launch_parses_submit_flag() {
        let cli = LauncherCli::try_parse_from([
            "exonum-launcher",
            "launch",
            "launch.json",
            "--submit",
            "--ephemeral-key",
        ])
        .unwrap();
        match cli.command {
            Commands::Launch(args) => {
                assert!(args.submit);
                assert!(args.keys.ephemeral_key);
                assert_eq!(args.file, PathBuf::from("launch.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
