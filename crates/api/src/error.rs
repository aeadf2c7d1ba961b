//! Error types for the api crate.

use thiserror::Error;

use crate::auth::Plane;

/// Result type for api operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the control-plane or compute API.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a resource returned a non-2xx status.
    #[error("failed to fetch {kind}: HTTP {status} {reason}")]
    Fetch {
        kind: String,
        status: u16,
        reason: String,
    },

    /// A response body could not be parsed into records.
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload { kind: String, reason: String },

    /// A create or update returned a non-2xx status.
    #[error("failed to write {kind} '{identity}': HTTP {status} {reason}")]
    Write {
        kind: String,
        identity: String,
        status: u16,
        reason: String,
    },

    /// Token acquisition failed.
    #[error("{plane} login failed: {reason}")]
    Auth { plane: Plane, reason: String },

    /// Configuration error.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration file parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch_failed(kind: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::Fetch {
            kind: kind.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Create a malformed payload error.
    pub fn malformed(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Create a write error.
    pub fn write_failed(
        kind: impl Into<String>,
        identity: impl Into<String>,
        status: u16,
        reason: impl Into<String>,
    ) -> Self {
        Self::Write {
            kind: kind.into(),
            identity: identity.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Create an auth error.
    pub fn auth_failed(plane: Plane, reason: impl Into<String>) -> Self {
        Self::Auth {
            plane,
            reason: reason.into(),
        }
    }

    /// Create a config error.
    pub fn config_error(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_names_identity_and_status() {
        let err = Error::write_failed("collection", "team-a", 409, "Conflict");
        let message = err.to_string();
        assert!(message.contains("team-a"));
        assert!(message.contains("409"));
        assert!(message.contains("Conflict"));
    }
}
