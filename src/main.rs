//! # pcsync - entry point
//!
//! 1. **Arguments** - parse the command line, environment overrides included
//! 2. **Tracing** - install the subscriber; `--verbose` lowers the default
//!    level to `debug`
//! 3. **Settings** - load the settings file and apply overrides
//! 4. **Command** - run one reconciliation and print its summary
//!
//! ## Error Handling
//!
//! Every failure, whether a missing credential or a rejected request, is
//! logged, printed with its context chain, and ends the process with exit
//! code `1`.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pcsync::cli::Cli;
use pcsync::commands::execute_command;
use pcsync_api::Settings;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let settings = Settings::load(cli.config.as_deref())
        .context("Failed to load settings")?
        .with_overrides(cli.overrides.into());
    debug!(dry_run = cli.dry_run, "Settings loaded");

    execute_command(cli.command, &settings, cli.dry_run)
}

/// Initialize tracing subscriber with environment filter. Logs go to stderr
/// so stdout only carries the summary.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
