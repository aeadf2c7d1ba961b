//! Diff-based reconciliation of desired items against remote collections.
//!
//! This crate implements the convergence core of `pcsync`:
//!
//! - **Desired State**: what the operator wants present (a namespace in a
//!   collection, a registry host, a rule, an account credential)
//! - **Observed State**: the collection as last fetched from the API
//! - **Diff**: classify the desired item as absent, present, or present but
//!   missing the item
//! - **Payload**: the mutated copy of the observed record the writer sends
//!
//! # Reconciliation
//!
//! Nothing here performs I/O or keeps state between runs. Re-running against
//! freshly fetched state converges: the second run of the same desired item
//! reports `AlreadySatisfied` and nothing is written.
//!
//! # Example
//!
//! ```
//! use pcsync_reconciler::{Collection, ReconcileStatus, Reconciler};
//!
//! let reconciler = Reconciler::default();
//! let observed = vec![Collection {
//!     name: "team-a".to_string(),
//!     namespaces: vec!["billing".to_string()],
//!     ..Default::default()
//! }];
//!
//! let diff = reconciler.reconcile_namespace("team-a", "payments", &observed)?;
//! assert_eq!(diff.status, ReconcileStatus::NeedsMerge);
//! assert_eq!(diff.payload.namespaces, vec!["billing", "payments"]);
//! # Ok::<(), pcsync_reconciler::Error>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod desired;
pub mod error;
pub mod reconciler;
pub mod types;

// Re-export main types
pub use error::{Error, Result};
pub use reconciler::{Reconciler, ReconcilerConfig, reconcile, require_credential};
pub use types::{
    CloudAccount, Collection, CollectionRef, Credential, DesiredItem, DiffResult, PolicyRule,
    ReconcileStatus, RegistrySettings, RegistrySpecification, ScopedRecord, VulnerabilityPolicy,
    WILDCARD,
};
