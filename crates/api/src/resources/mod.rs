//! Capability set: one small adapter per resource kind.
//!
//! Every adapter reads through [`Fetch`] and, when the kind is writable,
//! writes through [`Write`]. The writer turns a reconciler [`DiffResult`]
//! into at most one request.

mod compute;
mod control;

use pcsync_reconciler::{DiffResult, ReconcileStatus};
use serde::Serialize;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::Result;

pub use compute::{Collections, Credentials, Registries, VulnerabilityRules};
pub use control::{CloudAccounts, RegistryDiscovery, parse_login_servers};

/// A remote resource kind.
pub trait Resource {
    /// Kind name used in logs and errors.
    const KIND: &'static str;
}

/// Remote state fetcher.
pub trait Fetch: Resource {
    type Output;

    /// Fetch the current remote state.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` on a non-2xx status and `MalformedPayload` on an
    /// unparsable body.
    fn fetch(&self, client: &ApiClient) -> Result<Self::Output>;
}

/// What the writer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Skipped,
}

impl WriteOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "unchanged",
        }
    }
}

/// Writer for a resource kind.
pub trait Write: Resource {
    type Payload: Serialize;

    /// Identity of a payload, quoted in logs and errors.
    fn identity(&self, payload: &Self::Payload) -> String;

    /// Issue the create call.
    ///
    /// # Errors
    ///
    /// Returns `Write` on a non-2xx status.
    fn create(&self, client: &ApiClient, payload: &Self::Payload) -> Result<()>;

    /// Issue the full-replace update call.
    ///
    /// # Errors
    ///
    /// Returns `Write` on a non-2xx status.
    fn update(&self, client: &ApiClient, payload: &Self::Payload) -> Result<()>;

    /// Create, update or do nothing according to the diff status.
    ///
    /// # Errors
    ///
    /// Returns `Write` on a non-2xx status.
    fn write(&self, client: &ApiClient, diff: &DiffResult<Self::Payload>) -> Result<WriteOutcome> {
        let identity = self.identity(&diff.payload);
        let outcome = match diff.status {
            ReconcileStatus::AlreadySatisfied => {
                debug!(kind = Self::KIND, %identity, "Nothing to write");
                return Ok(WriteOutcome::Skipped);
            }
            ReconcileStatus::NeedsCreate => {
                self.create(client, &diff.payload)?;
                WriteOutcome::Created
            }
            ReconcileStatus::NeedsMerge => {
                self.update(client, &diff.payload)?;
                WriteOutcome::Updated
            }
        };
        info!(kind = Self::KIND, %identity, outcome = outcome.label(), "Wrote");
        Ok(outcome)
    }
}
