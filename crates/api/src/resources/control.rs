//! Control-plane adapters. These only read: they resolve what the compute
//! side should contain.

use pcsync_reconciler::CloudAccount;
use serde_json::json;
use tracing::debug;

use super::{Fetch, Resource};
use crate::client::ApiClient;
use crate::error::Result;
use crate::records::{decode_records, parse_records};

const CONFIG_SEARCH: &[&str] = &["search", "config"];
const CSV: &str = "text/csv; charset=UTF-8";

/// Config query listing container registries with their login server as the
/// last column.
pub const ACR_QUERY: &str = "config from cloud.resource where api.name = 'azure-container-registry' addcolumn properties.loginServer";

/// Header lines preceding the rows of a config search CSV export.
const CSV_HEADER_LINES: usize = 2;

/// Login servers from a config search CSV export: the header lines are
/// skipped and the last column of each row is kept.
pub fn parse_login_servers(csv: &str) -> Vec<String> {
    csv.lines()
        .skip(CSV_HEADER_LINES)
        .filter_map(|row| row.rsplit(',').next())
        .map(|cell| cell.trim().trim_matches('"').trim().to_string())
        .filter(|host| !host.is_empty())
        .collect()
}

/// Registry login servers discovered by a config search.
#[derive(Debug, Clone)]
pub struct RegistryDiscovery {
    query: String,
    lookback_hours: u32,
}

impl Default for RegistryDiscovery {
    fn default() -> Self {
        Self {
            query: ACR_QUERY.to_string(),
            lookback_hours: 24,
        }
    }
}

impl Resource for RegistryDiscovery {
    const KIND: &'static str = "registry search";
}

impl Fetch for RegistryDiscovery {
    type Output = Vec<String>;

    fn fetch(&self, client: &ApiClient) -> Result<Vec<String>> {
        let body = json!({
            "timeRange": {
                "type": "relative",
                "value": { "unit": "hour", "amount": self.lookback_hours }
            },
            "withResourceJson": true,
            "query": self.query,
        });
        let csv = client.query_text(Self::KIND, CONFIG_SEARCH, &body, CSV)?;
        let hosts = parse_login_servers(&csv);
        debug!(found = hosts.len(), "Discovered registries");
        Ok(hosts)
    }
}

/// Cloud accounts under one tenant.
#[derive(Debug, Clone)]
pub struct CloudAccounts {
    tenant_id: String,
}

impl CloudAccounts {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }
}

impl Resource for CloudAccounts {
    const KIND: &'static str = "cloud account";
}

impl Fetch for CloudAccounts {
    type Output = Vec<CloudAccount>;

    fn fetch(&self, client: &ApiClient) -> Result<Vec<CloudAccount>> {
        let path = ["cloud", "azure", self.tenant_id.as_str(), "project"];
        let body = client.get_text(
            Self::KIND,
            &path,
            &[("excludeAccountGropupDetails", "true")],
        )?;
        decode_records(Self::KIND, parse_records(Self::KIND, &body)?)
    }
}
