#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # pcsync-api
//!
//! Adapters between the reconciler and the two remote APIs.
//!
//! The control plane is read to discover what should exist (container
//! registries, cloud accounts). The compute API holds what is enforced
//! (collections, registry scanning settings, credentials, vulnerability
//! rules) and is the only plane written to.
//!
//! ## Features
//!
//! - Token login per plane, with the token applied to every later call
//! - Percent-encoded resource paths
//! - Array and line-delimited list responses decoded the same way
//! - One fetch/write adapter per resource kind
//!
//! ## Example
//!
//! ```ignore
//! use pcsync_api::{ApiClient, Collections, Fetch, Plane, Settings, Write};
//! use pcsync_reconciler::Reconciler;
//!
//! let settings = Settings::load(None)?;
//! let compute = ApiClient::connect(&settings.compute, Plane::Compute)?;
//!
//! let observed = Collections.fetch(&compute)?;
//! let diff = Reconciler::default().reconcile_namespace("team-a", "payments", &observed)?;
//! Collections.write(&compute, &diff)?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod records;
pub mod resources;

// Re-export commonly used items
pub use auth::{AuthContext, CONTROL_AUTH_HEADER, Plane, login};
pub use client::{ApiClient, http_client, join_segments};
pub use config::{DEFAULT_CONFIG_FILE, Endpoint, Overrides, Settings};
pub use error::{Error, Result};
pub use records::{Record, decode_records, parse_records};
pub use resources::{
    CloudAccounts, Collections, Credentials, Fetch, Registries, RegistryDiscovery, Resource,
    VulnerabilityRules, Write, WriteOutcome, parse_login_servers,
};
