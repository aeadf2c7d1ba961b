//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pcsync_api::Overrides;

/// pcsync - converge compute security configuration
#[derive(Parser, Debug)]
#[command(name = "pcsync")]
#[command(version)]
#[command(about = "Idempotently reconcile collections, registries, rules and credentials")]
#[command(
    long_about = "pcsync reads desired state from its arguments and the control plane, compares it with the compute API, and writes only what is missing. Running the same command twice writes nothing the second time."
)]
pub struct Cli {
    /// Settings file (defaults to ./pcsync.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Fetch and reconcile, but issue no writes
    #[arg(long, global = true, default_value_t = false)]
    pub dry_run: bool,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Values that replace the settings file.
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Control-plane API base URL
    #[arg(long, env = "PCSYNC_CONTROL_API", global = true)]
    pub control_api: Option<String>,

    /// Compute API base URL
    #[arg(long, env = "PCSYNC_COMPUTE_API", global = true)]
    pub compute_api: Option<String>,

    /// Access key for both planes
    #[arg(long, env = "PCSYNC_ACCESS_KEY", global = true)]
    pub access_key: Option<String>,

    /// Secret for both planes
    #[arg(long, env = "PCSYNC_SECRET", global = true, hide_env_values = true)]
    pub secret: Option<String>,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            control_api: args.control_api,
            compute_api: args.compute_api,
            access_key: args.access_key,
            secret: args.secret,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ensure a namespace belongs to a collection, and a rule targets it
    Namespace {
        /// Collection name
        #[arg(long)]
        collection: String,

        /// Namespace to add
        #[arg(short, long)]
        namespace: String,

        /// Leave the vulnerability policy untouched
        #[arg(long, default_value_t = false)]
        skip_policy: bool,
    },

    /// Scan every discovered container registry with a stored credential
    Registries {
        /// Credential id the new registry specifications use
        #[arg(long)]
        credential: String,
    },

    /// Create a credential for every cloud account of a tenant
    Accounts {
        /// Directory (tenant) id
        #[arg(short, long)]
        tenant_id: String,
    },

    /// Inspect settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings with secrets masked
    Show,
}
