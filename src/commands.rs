//! CLI command handlers.
//!
//! Every handler follows the same shape:
//! - fetch the observed state from the compute API (and the desired state
//!   from the control plane where it lives there)
//! - hand both to the reconciler
//! - write only what the diff asks for
//!
//! Handlers return the one-line summary the binary prints.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use anyhow::{Context, Result};
use pcsync_api::{
    ApiClient, CloudAccounts, Collections, Credentials, Fetch, Plane, Registries,
    RegistryDiscovery, Settings, VulnerabilityRules, Write,
};
use pcsync_reconciler::{DiffResult, ReconcileStatus, Reconciler};
use tracing::info;

use crate::cli::{Commands, ConfigCommands};

/// Execute a CLI command against the given settings.
///
/// This is the main command dispatcher that routes to the appropriate handler.
pub fn execute_command(command: Commands, settings: &Settings, dry_run: bool) -> Result<String> {
    let reconciler = Reconciler::default();

    match command {
        Commands::Namespace {
            collection,
            namespace,
            skip_policy,
        } => cmd_namespace(
            settings,
            &reconciler,
            &collection,
            &namespace,
            skip_policy,
            dry_run,
        ),

        Commands::Registries { credential } => {
            cmd_registries(settings, &reconciler, &credential, dry_run)
        }

        Commands::Accounts { tenant_id } => cmd_accounts(settings, &reconciler, &tenant_id, dry_run),

        Commands::Config {
            command: ConfigCommands::Show,
        } => cmd_config_show(settings),
    }
}

fn connect(settings: &Settings, plane: Plane) -> Result<ApiClient> {
    ApiClient::connect(settings.endpoint(plane), plane)
        .with_context(|| format!("Could not connect to the {plane} API"))
}

/// Write a diff, or only log it during a dry run. Returns the summary label.
fn apply<W: Write>(
    writer: &W,
    client: &ApiClient,
    diff: &DiffResult<W::Payload>,
    dry_run: bool,
) -> Result<&'static str> {
    if dry_run {
        let planned = match diff.status {
            ReconcileStatus::NeedsCreate => "would create",
            ReconcileStatus::NeedsMerge => "would update",
            ReconcileStatus::AlreadySatisfied => "unchanged",
        };
        info!(
            kind = W::KIND,
            identity = %writer.identity(&diff.payload),
            planned,
            "Dry run, not writing"
        );
        return Ok(planned);
    }
    Ok(writer.write(client, diff)?.label())
}

/// Ensure `namespace` is in `collection`, then that a rule targets it.
fn cmd_namespace(
    settings: &Settings,
    reconciler: &Reconciler,
    collection: &str,
    namespace: &str,
    skip_policy: bool,
    dry_run: bool,
) -> Result<String> {
    info!(%collection, %namespace, skip_policy, "Reconciling namespace");
    let compute = connect(settings, Plane::Compute)?;

    let observed = Collections.fetch(&compute)?;
    let diff = reconciler.reconcile_namespace(collection, namespace, &observed)?;
    let collection_label = apply(&Collections, &compute, &diff, dry_run)?;
    let mut summary = format!("collection '{}': {collection_label}", diff.payload.name);

    if skip_policy {
        info!("Skipping vulnerability policy");
        return Ok(summary);
    }

    let policy = VulnerabilityRules.fetch(&compute)?;
    let diff = reconciler.insert_policy_rule(&policy, collection)?;
    let rule_label = apply(&VulnerabilityRules, &compute, &diff, dry_run)?;
    summary.push_str(&format!(", rule '{}': {rule_label}", collection.trim()));
    Ok(summary)
}

/// Add every discovered registry host that is not scanned yet.
fn cmd_registries(
    settings: &Settings,
    reconciler: &Reconciler,
    credential_id: &str,
    dry_run: bool,
) -> Result<String> {
    let compute = connect(settings, Plane::Compute)?;
    let credentials = Credentials.fetch(&compute)?;
    let credential = reconciler.require_credential(&credentials, credential_id)?;
    info!(credential = %credential.id, kind = %credential.kind, "Using credential");

    let control = connect(settings, Plane::Control)?;
    let discovered = RegistryDiscovery::default().fetch(&control)?;

    let observed = Registries.fetch(&compute)?;
    let residual = reconciler.registry_residual(&discovered, &observed);
    let diff = reconciler.add_registries(&observed, &residual, &credential.id)?;
    let label = apply(&Registries, &compute, &diff, dry_run)
        .with_context(|| format!("Failed to add registries {}", residual.join(", ")))?;

    Ok(format!(
        "registry settings: {label} ({} new of {} discovered)",
        residual.len(),
        discovered.len()
    ))
}

/// Create a credential for every account of `tenant_id` that has none.
fn cmd_accounts(
    settings: &Settings,
    reconciler: &Reconciler,
    tenant_id: &str,
    dry_run: bool,
) -> Result<String> {
    let tenant_id = tenant_id.trim();
    if tenant_id.is_empty() {
        return Err(pcsync_reconciler::Error::invalid_input("tenant id", "must not be empty").into());
    }

    let control = connect(settings, Plane::Control)?;
    let accounts = CloudAccounts::new(tenant_id).fetch(&control)?;

    let compute = connect(settings, Plane::Compute)?;
    let credentials = Credentials.fetch(&compute)?;
    let residual = reconciler.account_residual(&accounts, &credentials);
    info!(
        tenant = tenant_id,
        accounts = accounts.len(),
        missing = residual.len(),
        "Reconciled account credentials"
    );

    let mut label = "unchanged";
    for credential in reconciler.account_credentials(&residual)? {
        let id = credential.id.clone();
        label = apply(&Credentials, &compute, &DiffResult::needs_create(credential), dry_run)
            .with_context(|| format!("Failed to onboard account '{id}'"))?;
    }

    Ok(format!(
        "account credentials: {label} ({} new of {} accounts)",
        residual.len(),
        accounts.len()
    ))
}

/// Effective settings as TOML, secrets masked.
fn cmd_config_show(settings: &Settings) -> Result<String> {
    Ok(settings.redacted().to_toml()?.trim_end().to_string())
}
