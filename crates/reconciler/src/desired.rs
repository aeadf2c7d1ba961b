//! Desired state resolution.
//!
//! Turns operator parameters into canonical desired records. Everything here
//! is pure; the only failure is input validation.

use crate::error::{Error, Result};
use crate::types::{
    CloudAccount, Collection, CollectionRef, Credential, DesiredItem, PolicyRule,
    RegistrySpecification,
};

fn require(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Desired namespace membership of a collection.
///
/// The record to create is a wildcard-scoped collection whose `namespaces`
/// holds only the requested namespace.
///
/// # Errors
///
/// Returns `InvalidInput` if either value is blank.
pub fn namespace_in_collection(collection: &str, namespace: &str) -> Result<DesiredItem<Collection>> {
    let name = require("collection", collection)?;
    let namespace = require("namespace", namespace)?;

    let mut record = Collection::with_wildcard_scope(name);
    record.namespaces = vec![namespace.clone()];
    Ok(DesiredItem::new(record, namespace))
}

/// A vulnerability rule named after, and scoped to, a single collection.
///
/// # Errors
///
/// Returns `InvalidInput` if the collection name or effect is blank.
pub fn vulnerability_rule(collection: &str, effect: &str) -> Result<PolicyRule> {
    let name = require("collection", collection)?;
    let effect = require("effect", effect)?;
    Ok(PolicyRule {
        collections: vec![CollectionRef::new(name.clone())],
        name,
        effect,
        ..Default::default()
    })
}

/// Reduce a registry address to its host: drop an `http(s)://` scheme and
/// anything after the first `/`.
pub fn normalize_registry_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Apply a registry template to one host bound to a credential.
///
/// # Errors
///
/// Returns `InvalidInput` if the host or credential id is blank.
pub fn registry_specification(
    template: &RegistrySpecification,
    host: &str,
    credential_id: &str,
) -> Result<RegistrySpecification> {
    let registry = normalize_registry_host(host);
    if registry.is_empty() {
        return Err(Error::invalid_input("registry", "must not be empty"));
    }
    let credential_id = require("credential", credential_id)?;
    Ok(RegistrySpecification {
        registry,
        credential_id,
        ..template.clone()
    })
}

/// Credential record onboarding a cloud account; the account name becomes the
/// credential id.
///
/// # Errors
///
/// Returns `InvalidInput` if the account has no name or id.
pub fn credential_for_account(account: &CloudAccount, kind: &str) -> Result<Credential> {
    let id = require("account name", &account.name)?;
    let account_id = require("account id", &account.account_id)?;
    Ok(Credential {
        id,
        kind: kind.to_string(),
        account_id: Some(account_id),
        ..Default::default()
    })
}
