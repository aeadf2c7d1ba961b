//! Configuration for the API clients.
//!
//! One `Settings` value is built at startup and passed down by reference.
//! Each plane is an [`Endpoint`] holding exactly the recognized options
//! `accessKey`, `secret`, `api` and `apiEndpoints`, plus transport knobs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::Plane;
use crate::error::{Error, Result};

/// File read when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "pcsync.toml";

const MASK: &str = "********";

/// Connection settings for one API plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Access key or username.
    #[serde(default)]
    pub access_key: String,

    /// Secret or password.
    #[serde(default)]
    pub secret: String,

    /// Base URL of the API; wins over `api_endpoints` when set.
    #[serde(default)]
    pub api: String,

    /// Candidate base URLs, used when `api` is empty.
    #[serde(default)]
    pub api_endpoints: Vec<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification.
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_insecure() -> bool {
    true
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret: String::new(),
            api: String::new(),
            api_endpoints: Vec::new(),
            timeout_secs: default_timeout_secs(),
            insecure: default_insecure(),
        }
    }
}

impl Endpoint {
    /// Create an endpoint for a single base URL.
    pub fn with_api(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            ..Default::default()
        }
    }

    /// Set the login credentials.
    #[must_use]
    pub fn credentials(mut self, access_key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.access_key = access_key.into();
        self.secret = secret.into();
        self
    }

    /// Request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL for `plane`: `api` if set, else the only entry of
    /// `apiEndpoints`.
    ///
    /// # Errors
    ///
    /// Returns `Config` when no URL is configured, when several candidates
    /// leave the choice open, or when the URL does not parse.
    pub fn base_url(&self, plane: Plane) -> Result<Url> {
        let raw = if self.api.trim().is_empty() {
            match self.api_endpoints.as_slice() {
                [only] => only.as_str(),
                [] => {
                    return Err(Error::config_error(format!(
                        "no {plane} API configured: set `api` or `apiEndpoints`"
                    )));
                }
                many => {
                    return Err(Error::config_error(format!(
                        "{plane} `api` is empty and `apiEndpoints` lists several candidates ({}); set `api` to one of them",
                        many.join(", ")
                    )));
                }
            }
        } else {
            self.api.as_str()
        };

        Url::parse(raw.trim())
            .map_err(|e| Error::config_error(format!("invalid {plane} API URL '{raw}': {e}")))
    }

    /// Access key and secret, both required.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming whichever value is missing.
    pub fn login_pair(&self, plane: Plane) -> Result<(&str, &str)> {
        if self.access_key.trim().is_empty() {
            return Err(Error::config_error(format!("missing {plane} accessKey")));
        }
        if self.secret.is_empty() {
            return Err(Error::config_error(format!("missing {plane} secret")));
        }
        Ok((self.access_key.trim(), self.secret.as_str()))
    }

    /// Copy with the secret masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let secret = if self.secret.is_empty() {
            String::new()
        } else {
            MASK.to_string()
        };
        Self {
            secret,
            ..self.clone()
        }
    }
}

/// Command-line or environment values overriding the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub control_api: Option<String>,
    pub compute_api: Option<String>,
    pub access_key: Option<String>,
    pub secret: Option<String>,
}

/// Settings for both API planes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Control-plane API (`x-redlock-auth` token).
    #[serde(default)]
    pub control: Endpoint,

    /// Compute API (bearer token).
    #[serde(default)]
    pub compute: Endpoint,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Toml` when the text is not valid settings.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Toml` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given (it must exist), otherwise from
    /// [`DEFAULT_CONFIG_FILE`] when present, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` for a missing explicit file, or any `from_file` error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = path.map_or_else(
            || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            |p| (p.to_path_buf(), true),
        );

        if !path.exists() {
            if explicit {
                return Err(Error::config_error(format!(
                    "config file '{}' not found",
                    path.display()
                )));
            }
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "Loading config file");
        Self::from_file(&path)
    }

    /// Apply overrides. The access key and secret apply to both planes, which
    /// share one identity.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(api) = overrides.control_api {
            self.control.api = api;
        }
        if let Some(api) = overrides.compute_api {
            self.compute.api = api;
        }
        if let Some(key) = overrides.access_key {
            self.control.access_key.clone_from(&key);
            self.compute.access_key = key;
        }
        if let Some(secret) = overrides.secret {
            self.control.secret.clone_from(&secret);
            self.compute.secret = secret;
        }
        self
    }

    /// Endpoint for a plane.
    pub const fn endpoint(&self, plane: Plane) -> &Endpoint {
        match plane {
            Plane::Control => &self.control,
            Plane::Compute => &self.compute,
        }
    }

    /// Copy with secrets masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            control: self.control.redacted(),
            compute: self.compute.redacted(),
        }
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns `Config` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[control]
accessKey = "key-id"
secret = "s3cret"
apiEndpoints = ["https://api.example.io", "https://api2.example.io"]

[compute]
accessKey = "key-id"
secret = "s3cret"
api = "https://console.example.io"
timeoutSecs = 5
insecure = false
"#;

    #[test]
    fn test_parse_recognized_options() -> Result<()> {
        let settings = Settings::from_toml(SAMPLE)?;
        assert_eq!(settings.control.access_key, "key-id");
        assert_eq!(settings.control.api_endpoints.len(), 2);
        assert_eq!(settings.compute.timeout(), Duration::from_secs(5));
        assert!(!settings.compute.insecure);
        assert!(settings.control.insecure);
        Ok(())
    }

    #[test]
    fn test_base_url_prefers_api() -> Result<()> {
        let settings = Settings::from_toml(SAMPLE)?;
        let url = settings.compute.base_url(Plane::Compute)?;
        assert_eq!(url.as_str(), "https://console.example.io/");
        Ok(())
    }

    #[test]
    fn test_base_url_ambiguous_endpoints_rejected() -> Result<()> {
        let settings = Settings::from_toml(SAMPLE)?;
        let err = settings.control.base_url(Plane::Control).err();
        assert!(matches!(err, Some(Error::Config { .. })));
        Ok(())
    }

    #[test]
    fn test_base_url_single_endpoint_selected() -> Result<()> {
        let endpoint = Endpoint {
            api_endpoints: vec!["https://api3.example.io".to_string()],
            ..Default::default()
        };
        let url = endpoint.base_url(Plane::Control)?;
        assert_eq!(url.host_str(), Some("api3.example.io"));
        Ok(())
    }

    #[test]
    fn test_login_pair_requires_secret() {
        let endpoint = Endpoint::with_api("https://x.io").credentials("key", "");
        let err = endpoint.login_pair(Plane::Compute).err();
        assert!(err.is_some_and(|e| e.to_string().contains("secret")));
    }

    #[test]
    fn test_overrides_win() -> Result<()> {
        let settings = Settings::from_toml(SAMPLE)?.with_overrides(Overrides {
            control_api: Some("https://api.other.io".to_string()),
            secret: Some("rotated".to_string()),
            ..Default::default()
        });
        assert_eq!(settings.control.api, "https://api.other.io");
        assert_eq!(settings.control.secret, "rotated");
        assert_eq!(settings.compute.secret, "rotated");
        assert_eq!(settings.compute.api, "https://console.example.io");
        Ok(())
    }

    #[test]
    fn test_redacted_masks_secret() -> Result<()> {
        let settings = Settings::from_toml(SAMPLE)?.redacted();
        let rendered = settings.to_toml()?;
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains(MASK));
        Ok(())
    }

    #[test]
    fn test_load_from_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pcsync.toml");
        std::fs::write(&path, SAMPLE)?;

        let settings = Settings::load(Some(&path))?;
        assert_eq!(settings.compute.api, "https://console.example.io");

        let missing = Settings::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(missing, Err(Error::Config { .. })));
        Ok(())
    }
}
