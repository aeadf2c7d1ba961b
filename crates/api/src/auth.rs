//! Token acquisition for both API planes.
//!
//! The control plane answers `POST /login` and expects the token back in the
//! `x-redlock-auth` header. The compute API answers
//! `POST /api/v1/authenticate` and expects `Authorization: Bearer <token>`.

use std::fmt;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::client::join_segments;
use crate::error::{Error, Result};

/// Header carrying the control-plane token.
pub const CONTROL_AUTH_HEADER: &str = "x-redlock-auth";

/// Which API a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    /// Cloud security control plane.
    Control,
    /// Workload protection (compute) console.
    Compute,
}

impl Plane {
    /// Path segments of the login endpoint.
    pub const fn login_path(self) -> &'static [&'static str] {
        match self {
            Self::Control => &["login"],
            Self::Compute => &["api", "v1", "authenticate"],
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => f.write_str("control-plane"),
            Self::Compute => f.write_str("compute"),
        }
    }
}

/// A token bound to the plane that issued it.
#[derive(Clone)]
pub struct AuthContext {
    plane: Plane,
    token: String,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("plane", &self.plane)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl AuthContext {
    /// Wrap an already acquired token.
    pub fn new(plane: Plane, token: impl Into<String>) -> Self {
        Self {
            plane,
            token: token.into(),
        }
    }

    /// Attach the token the way the issuing plane expects it.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self.plane {
            Plane::Control => request.header(CONTROL_AUTH_HEADER, &self.token),
            Plane::Compute => request.bearer_auth(&self.token),
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Log in to `plane` at `base_url`.
///
/// # Errors
///
/// Returns `Auth` on a non-2xx status, an unreadable body or a missing token,
/// and `Http` when the request cannot be sent.
pub fn login(
    http: &Client,
    base_url: &Url,
    plane: Plane,
    username: &str,
    password: &str,
) -> Result<AuthContext> {
    let url = join_segments(base_url, plane.login_path())?;
    debug!(%plane, url = %url, "Requesting token");

    let response = http
        .post(url)
        .json(&LoginRequest { username, password })
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::auth_failed(
            plane,
            format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            ),
        ));
    }

    let body = response.text()?;
    let token = serde_json::from_str::<LoginResponse>(&body)
        .map_err(|e| Error::auth_failed(plane, format!("unreadable login response: {e}")))?
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::auth_failed(plane, "login response carried no token"))?;

    info!(%plane, "Authenticated");
    Ok(AuthContext::new(plane, token))
}
