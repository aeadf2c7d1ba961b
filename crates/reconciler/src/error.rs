//! Error types for the reconciler crate.

use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A desired-state input failed validation.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A referenced credential is not among the known credentials.
    #[error("credential '{credential_id}' not found among compute credentials")]
    UnknownCredential { credential_id: String },
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown credential error.
    pub fn unknown_credential(credential_id: impl Into<String>) -> Self {
        Self::UnknownCredential {
            credential_id: credential_id.into(),
        }
    }
}
