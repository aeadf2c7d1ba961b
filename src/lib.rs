#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # pcsync
//!
//! Converges compute security configuration toward what the operator asks
//! for, writing only the difference.
//!
//! This library exposes the CLI definitions and command handlers, and
//! re-exports the workspace crates for convenience.

pub mod cli;
pub mod commands;

// Re-export workspace crates
pub use pcsync_api;
pub use pcsync_reconciler;
