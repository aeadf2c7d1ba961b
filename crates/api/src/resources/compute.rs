//! Compute API adapters.

use pcsync_reconciler::{Collection, Credential, RegistrySettings, VulnerabilityPolicy};
use reqwest::Method;

use super::{Fetch, Resource, Write};
use crate::client::ApiClient;
use crate::error::Result;
use crate::records::{decode_records, parse_records};

const COLLECTIONS: &[&str] = &["api", "v1", "collections"];
const REGISTRY_SETTINGS: &[&str] = &["api", "v1", "settings", "registry"];
const CREDENTIALS: &[&str] = &["api", "v1", "credentials"];
const VULNERABILITY_IMAGES: &[&str] = &["api", "v1", "policies", "vulnerability", "images"];

/// `/api/v1/collections`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collections;

impl Resource for Collections {
    const KIND: &'static str = "collection";
}

impl Fetch for Collections {
    type Output = Vec<Collection>;

    fn fetch(&self, client: &ApiClient) -> Result<Vec<Collection>> {
        let body = client.get_text(Self::KIND, COLLECTIONS, &[])?;
        decode_records(Self::KIND, parse_records(Self::KIND, &body)?)
    }
}

impl Write for Collections {
    type Payload = Collection;

    fn identity(&self, payload: &Collection) -> String {
        payload.name.clone()
    }

    fn create(&self, client: &ApiClient, payload: &Collection) -> Result<()> {
        client.send(Method::POST, Self::KIND, &payload.name, COLLECTIONS, payload)
    }

    fn update(&self, client: &ApiClient, payload: &Collection) -> Result<()> {
        let mut path = COLLECTIONS.to_vec();
        path.push(payload.name.as_str());
        client.send(Method::PUT, Self::KIND, &payload.name, &path, payload)
    }
}

/// `/api/v1/settings/registry`. The settings document always exists, so
/// both create and update replace it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registries;

impl Resource for Registries {
    const KIND: &'static str = "registry settings";
}

impl Fetch for Registries {
    type Output = RegistrySettings;

    fn fetch(&self, client: &ApiClient) -> Result<RegistrySettings> {
        client.get_json(Self::KIND, REGISTRY_SETTINGS)
    }
}

impl Write for Registries {
    type Payload = RegistrySettings;

    fn identity(&self, payload: &RegistrySettings) -> String {
        format!("{} specifications", payload.specifications.len())
    }

    fn create(&self, client: &ApiClient, payload: &RegistrySettings) -> Result<()> {
        self.update(client, payload)
    }

    fn update(&self, client: &ApiClient, payload: &RegistrySettings) -> Result<()> {
        let identity = self.identity(payload);
        client.send(Method::PUT, Self::KIND, &identity, REGISTRY_SETTINGS, payload)
    }
}

/// `/api/v1/credentials`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials;

impl Resource for Credentials {
    const KIND: &'static str = "credential";
}

impl Fetch for Credentials {
    type Output = Vec<Credential>;

    fn fetch(&self, client: &ApiClient) -> Result<Vec<Credential>> {
        let body = client.get_text(Self::KIND, CREDENTIALS, &[])?;
        decode_records(Self::KIND, parse_records(Self::KIND, &body)?)
    }
}

impl Write for Credentials {
    type Payload = Credential;

    fn identity(&self, payload: &Credential) -> String {
        payload.id.clone()
    }

    fn create(&self, client: &ApiClient, payload: &Credential) -> Result<()> {
        client.send(Method::POST, Self::KIND, &payload.id, CREDENTIALS, payload)
    }

    // The credentials endpoint upserts on POST.
    fn update(&self, client: &ApiClient, payload: &Credential) -> Result<()> {
        self.create(client, payload)
    }
}

/// `/api/v1/policies/vulnerability/images`. Adding a rule rewrites the whole
/// policy document.
#[derive(Debug, Clone, Copy, Default)]
pub struct VulnerabilityRules;

impl Resource for VulnerabilityRules {
    const KIND: &'static str = "vulnerability policy";
}

impl Fetch for VulnerabilityRules {
    type Output = VulnerabilityPolicy;

    fn fetch(&self, client: &ApiClient) -> Result<VulnerabilityPolicy> {
        client.get_json(Self::KIND, VULNERABILITY_IMAGES)
    }
}

impl Write for VulnerabilityRules {
    type Payload = VulnerabilityPolicy;

    fn identity(&self, payload: &VulnerabilityPolicy) -> String {
        payload
            .rules
            .first()
            .map_or_else(|| "images".to_string(), |r| r.name.clone())
    }

    fn create(&self, client: &ApiClient, payload: &VulnerabilityPolicy) -> Result<()> {
        self.update(client, payload)
    }

    fn update(&self, client: &ApiClient, payload: &VulnerabilityPolicy) -> Result<()> {
        let identity = self.identity(payload);
        client.send(Method::PUT, Self::KIND, &identity, VULNERABILITY_IMAGES, payload)
    }
}
