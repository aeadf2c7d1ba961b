//! Core types for the reconciler.
//!
//! Every remote record keeps the vendor's field names on the wire and carries
//! an `extra` map holding whatever fields this crate does not model, so a
//! full-replace update writes back exactly what was fetched plus the merge.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scope value matching everything.
pub const WILDCARD: &str = "*";

fn wildcard() -> Vec<String> {
    vec![WILDCARD.to_string()]
}

/// A named scope grouping (namespaces, clusters, images, ...).
///
/// Scope fields other than `namespaces` are optional so that a fetched record
/// is written back exactly as read: an absent field stays absent and an empty
/// list stays `[]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Collection {
    /// Unique key within the compute API.
    pub name: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<String>>,
    #[serde(rename = "codeRepos", default, skip_serializing_if = "Option::is_none")]
    pub code_repos: Option<Vec<String>>,
    #[serde(rename = "accountIDs", default, skip_serializing_if = "Option::is_none")]
    pub account_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(rename = "appIDs", default, skip_serializing_if = "Option::is_none")]
    pub app_ids: Option<Vec<String>>,
    /// Vendor fields not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    /// A collection whose every scope field, namespaces included, is `["*"]`.
    pub fn with_wildcard_scope(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespaces: wildcard(),
            functions: Some(wildcard()),
            code_repos: Some(wildcard()),
            account_ids: Some(wildcard()),
            clusters: Some(wildcard()),
            containers: Some(wildcard()),
            hosts: Some(wildcard()),
            images: Some(wildcard()),
            labels: Some(wildcard()),
            app_ids: Some(wildcard()),
            extra: Map::new(),
        }
    }
}

/// One registry scan target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySpecification {
    /// Registry kind, e.g. `azure`.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub os: String,
    /// Number of most recent images scanned per repository.
    #[serde(default)]
    pub cap: u32,
    #[serde(rename = "credentialID", default)]
    pub credential_id: String,
    /// Scanner parallelism.
    #[serde(default)]
    pub scanners: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/api/v1/settings/registry`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistrySettings {
    #[serde(default)]
    pub specifications: Vec<RegistrySpecification>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference from a rule to a collection by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionRef {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// A named rule; rules are evaluated in list order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    #[serde(default)]
    pub collections: Vec<CollectionRef>,
    #[serde(default)]
    pub effect: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/api/v1/policies/vulnerability/images`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VulnerabilityPolicy {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VulnerabilityPolicy {
    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Stored external identity owned by the compute API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "accountID", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cloud account onboarded in the control plane.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloudAccount {
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A record owning a plural field that desired items are merged into.
pub trait ScopedRecord: Clone {
    /// Element type of the plural field.
    type Member: PartialEq + Clone + fmt::Debug;

    fn members(&self) -> &[Self::Member];

    fn members_mut(&mut self) -> &mut Vec<Self::Member>;
}

impl ScopedRecord for Collection {
    type Member = String;

    fn members(&self) -> &[String] {
        &self.namespaces
    }

    fn members_mut(&mut self) -> &mut Vec<String> {
        &mut self.namespaces
    }
}

/// A desired item: the record to create when nothing matches, and the member
/// that must be present in whichever record does match.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredItem<T: ScopedRecord> {
    pub record: T,
    pub member: T::Member,
}

impl<T: ScopedRecord> DesiredItem<T> {
    pub const fn new(record: T, member: T::Member) -> Self {
        Self { record, member }
    }
}

/// Classification of a desired item against the observed collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconcileStatus {
    /// No matching record; a fresh one must be created.
    NeedsCreate,
    /// A matching record lacks the item; the merged record must replace it.
    NeedsMerge,
    /// Nothing to write.
    AlreadySatisfied,
}

impl fmt::Display for ReconcileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NeedsCreate => "needs-create",
            Self::NeedsMerge => "needs-merge",
            Self::AlreadySatisfied => "already-satisfied",
        };
        f.write_str(label)
    }
}

/// Outcome of reconciliation: the status plus the payload the writer sends.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult<T> {
    pub status: ReconcileStatus,
    pub payload: T,
}

impl<T> DiffResult<T> {
    pub const fn needs_create(payload: T) -> Self {
        Self {
            status: ReconcileStatus::NeedsCreate,
            payload,
        }
    }

    pub const fn needs_merge(payload: T) -> Self {
        Self {
            status: ReconcileStatus::NeedsMerge,
            payload,
        }
    }

    pub const fn already_satisfied(payload: T) -> Self {
        Self {
            status: ReconcileStatus::AlreadySatisfied,
            payload,
        }
    }

    /// Whether the writer has to issue a request.
    pub fn needs_write(&self) -> bool {
        self.status != ReconcileStatus::AlreadySatisfied
    }
}
