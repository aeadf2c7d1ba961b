//! Reconciler implementation.

use std::collections::HashSet;

use itertools::Itertools;
use tracing::{debug, info};

use crate::desired;
use crate::error::{Error, Result};
use crate::types::{
    CloudAccount, Collection, Credential, DesiredItem, DiffResult, RegistrySettings,
    RegistrySpecification, ScopedRecord, VulnerabilityPolicy,
};

/// Reconcile one desired item against the observed records.
///
/// The first observed record whose key equals the desired record's key wins.
/// No match yields `NeedsCreate` with the desired record; a match already
/// holding the member yields `AlreadySatisfied` with the match untouched;
/// otherwise the member is appended to the match and `NeedsMerge` returned.
pub fn reconcile<T, K, F>(desired: &DesiredItem<T>, observed: &[T], match_key: F) -> DiffResult<T>
where
    T: ScopedRecord,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let wanted = match_key(&desired.record);

    match observed.iter().find(|record| match_key(*record) == wanted) {
        None => DiffResult::needs_create(desired.record.clone()),
        Some(found) if found.members().contains(&desired.member) => {
            DiffResult::already_satisfied(found.clone())
        }
        Some(found) => {
            let mut merged = found.clone();
            merged.members_mut().push(desired.member.clone());
            DiffResult::needs_merge(merged)
        }
    }
}

/// Fail unless `credential_id` names one of the known credentials of type
/// `kind`. A credential of another type does not count.
///
/// # Errors
///
/// Returns `UnknownCredential` when no credential of that type carries that id.
pub fn require_credential<'a>(
    credentials: &'a [Credential],
    kind: &str,
    credential_id: &str,
) -> Result<&'a Credential> {
    credentials
        .iter()
        .filter(|c| c.kind == kind)
        .find(|c| c.id == credential_id)
        .ok_or_else(|| Error::unknown_credential(credential_id))
}

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Defaults applied to every registry specification created.
    pub registry_template: RegistrySpecification,
    /// Effect of vulnerability rules created for a collection.
    pub rule_effect: String,
    /// Credential type matched when onboarding accounts and binding registries.
    pub credential_kind: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            registry_template: RegistrySpecification {
                version: "azure".to_string(),
                os: "linux".to_string(),
                cap: 5,
                scanners: 2,
                ..Default::default()
            },
            rule_effect: "alert".to_string(),
            credential_kind: "azure".to_string(),
        }
    }
}

/// Reconciler for collections, registries, policy rules and credentials.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler.
    pub const fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Ensure `namespace` is listed in collection `collection`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank collection or namespace.
    pub fn reconcile_namespace(
        &self,
        collection: &str,
        namespace: &str,
        observed: &[Collection],
    ) -> Result<DiffResult<Collection>> {
        let desired = desired::namespace_in_collection(collection, namespace)?;
        let diff = reconcile(&desired, observed, |c: &Collection| c.name.clone());

        info!(
            collection = %desired.record.name,
            namespace = %desired.member,
            observed = observed.len(),
            status = %diff.status,
            "Reconciled collection namespace"
        );
        Ok(diff)
    }

    /// Desired registry hosts not yet configured.
    ///
    /// Only observed specifications of the template's `version` count. Hosts
    /// are compared after normalization and duplicates collapse. The order of
    /// the result follows `desired` but callers must not rely on it.
    pub fn registry_residual(&self, desired: &[String], observed: &RegistrySettings) -> Vec<String> {
        let version = &self.config.registry_template.version;
        let configured: HashSet<String> = observed
            .specifications
            .iter()
            .filter(|spec| &spec.version == version)
            .map(|spec| desired::normalize_registry_host(&spec.registry))
            .collect();

        let residual = desired
            .iter()
            .map(|host| desired::normalize_registry_host(host))
            .filter(|host| !host.is_empty() && !configured.contains(host))
            .unique()
            .collect_vec();

        debug!(
            desired = desired.len(),
            configured = configured.len(),
            residual = residual.len(),
            "Computed registry residual"
        );
        residual
    }

    /// Append one templated specification per residual host.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank credential id.
    pub fn add_registries(
        &self,
        observed: &RegistrySettings,
        residual: &[String],
        credential_id: &str,
    ) -> Result<DiffResult<RegistrySettings>> {
        if residual.is_empty() {
            return Ok(DiffResult::already_satisfied(observed.clone()));
        }

        let additions = residual
            .iter()
            .map(|host| {
                desired::registry_specification(&self.config.registry_template, host, credential_id)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut settings = observed.clone();
        for spec in additions {
            debug!(registry = %spec.registry, credential = %spec.credential_id, "Adding registry");
            settings.specifications.push(spec);
        }
        Ok(DiffResult::needs_merge(settings))
    }

    /// Ensure a rule named after `collection` exists, inserting it at the
    /// head of the rule list so it takes precedence over existing rules.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank collection name.
    pub fn insert_policy_rule(
        &self,
        policy: &VulnerabilityPolicy,
        collection: &str,
    ) -> Result<DiffResult<VulnerabilityPolicy>> {
        let rule = desired::vulnerability_rule(collection, &self.config.rule_effect)?;

        if policy.rules.iter().any(|r| r.name == rule.name) {
            debug!(rule = %rule.name, "Rule already present");
            return Ok(DiffResult::already_satisfied(policy.clone()));
        }

        info!(rule = %rule.name, effect = %rule.effect, "Inserting rule at head");
        let mut updated = policy.clone();
        updated.rules.insert(0, rule);
        Ok(DiffResult::needs_create(updated))
    }

    /// Accounts with no credential of the configured kind named after them.
    pub fn account_residual(&self, accounts: &[CloudAccount], credentials: &[Credential]) -> Vec<CloudAccount> {
        let known: HashSet<&str> = credentials
            .iter()
            .filter(|c| c.kind == self.config.credential_kind)
            .map(|c| c.id.as_str())
            .collect();

        accounts
            .iter()
            .filter(|a| !known.contains(a.name.as_str()))
            .unique_by(|a| a.name.clone())
            .cloned()
            .collect_vec()
    }

    /// Credential records to create for the given accounts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an account missing its name or id.
    pub fn account_credentials(&self, accounts: &[CloudAccount]) -> Result<Vec<Credential>> {
        accounts
            .iter()
            .map(|a| desired::credential_for_account(a, &self.config.credential_kind))
            .collect()
    }

    /// The credential new registry specifications will bind to; it must be
    /// of the configured credential type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCredential` when no such credential exists.
    pub fn require_credential<'a>(
        &self,
        credentials: &'a [Credential],
        credential_id: &str,
    ) -> Result<&'a Credential> {
        require_credential(credentials, &self.config.credential_kind, credential_id)
    }
}
