//! Blocking HTTP client bound to one API plane.

use reqwest::Method;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{self, AuthContext, Plane};
use crate::config::Endpoint;
use crate::error::{Error, Result};

const JSON: &str = "application/json";
const BODY_SNIPPET_CHARS: usize = 200;

/// Append percent-encoded path segments to a base URL.
///
/// # Errors
///
/// Returns `Config` if the base URL cannot carry a path.
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::config_error(format!("'{base}' cannot be used as an API base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Build the HTTP client for an endpoint's transport settings.
///
/// # Errors
///
/// Returns `Http` if the TLS backend cannot be initialized.
pub fn http_client(endpoint: &Endpoint) -> Result<Client> {
    let client = Client::builder()
        .timeout(endpoint.timeout())
        .danger_accept_invalid_certs(endpoint.insecure)
        .build()?;
    Ok(client)
}

/// Client for one plane: base URL plus the token it issued.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    auth: AuthContext,
}

impl ApiClient {
    /// Create a client from parts.
    pub const fn new(http: Client, base_url: Url, auth: AuthContext) -> Self {
        Self {
            http,
            base_url,
            auth,
        }
    }

    /// Resolve the endpoint and log in.
    ///
    /// # Errors
    ///
    /// Returns `Config` for a missing URL or credentials and `Auth` when the
    /// login is refused.
    pub fn connect(endpoint: &Endpoint, plane: Plane) -> Result<Self> {
        let base_url = endpoint.base_url(plane)?;
        let (username, password) = endpoint.login_pair(plane)?;
        let http = http_client(endpoint)?;
        let auth = auth::login(&http, &base_url, plane, username, password)?;
        Ok(Self::new(http, base_url, auth))
    }

    /// URL of `segments` under the base URL.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the base URL cannot carry a path.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.base_url, segments)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::blocking::RequestBuilder {
        self.auth.apply(self.http.request(method, url))
    }

    /// GET a resource and return the raw body.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` on a non-2xx status and `Http` on transport failure.
    pub fn get_text(&self, kind: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<String> {
        let url = self.url(segments)?;
        debug!(kind, url = %url, "GET");
        let response = self
            .request(Method::GET, url)
            .header(ACCEPT, JSON)
            .query(query)
            .send()?;
        read_body(kind, response)
    }

    /// GET a JSON document.
    ///
    /// # Errors
    ///
    /// As [`Self::get_text`], plus `MalformedPayload` when the body does not
    /// decode into `T`.
    pub fn get_json<T: DeserializeOwned>(&self, kind: &str, segments: &[&str]) -> Result<T> {
        let body = self.get_text(kind, segments, &[])?;
        serde_json::from_str(&body).map_err(|e| Error::malformed(kind, e.to_string()))
    }

    /// POST a query whose answer is read, not written (searches).
    ///
    /// # Errors
    ///
    /// Returns `Fetch` on a non-2xx status and `Http` on transport failure.
    pub fn query_text<B: Serialize + ?Sized>(
        &self,
        kind: &str,
        segments: &[&str],
        body: &B,
        accept: &str,
    ) -> Result<String> {
        let url = self.url(segments)?;
        debug!(kind, url = %url, "POST query");
        let response = self
            .request(Method::POST, url)
            .header(ACCEPT, accept)
            .header(CONTENT_TYPE, JSON)
            .json(body)
            .send()?;
        read_body(kind, response)
    }

    /// Send a create or update carrying `body`.
    ///
    /// # Errors
    ///
    /// Returns `Write` naming `identity` on a non-2xx status and `Http` on
    /// transport failure.
    pub fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        kind: &str,
        identity: &str,
        segments: &[&str],
        body: &B,
    ) -> Result<()> {
        let url = self.url(segments)?;
        debug!(kind, identity, %method, url = %url, "Writing");
        let response = self.request(method, url).json(body).send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let reason = failure_reason(status, response);
        warn!(kind, identity, status = status.as_u16(), %reason, "Write rejected");
        Err(Error::write_failed(kind, identity, status.as_u16(), reason))
    }
}

fn read_body(kind: &str, response: Response) -> Result<String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.text()?);
    }
    let reason = failure_reason(status, response);
    Err(Error::fetch_failed(kind, status.as_u16(), reason))
}

/// Canonical reason followed by the start of the body, if any.
fn failure_reason(status: reqwest::StatusCode, response: Response) -> String {
    let canonical = status.canonical_reason().unwrap_or("unknown status");
    let body = response.text().unwrap_or_default();
    let snippet: String = body.trim().chars().take(BODY_SNIPPET_CHARS).collect();
    if snippet.is_empty() {
        canonical.to_string()
    } else {
        format!("{canonical}: {snippet}")
    }
}
