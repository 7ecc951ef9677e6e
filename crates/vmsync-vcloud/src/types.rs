//! Connection config and wire types for the Cloud Director API.

use serde::Deserialize;
use std::fmt;
use vmsync_core::{NetworkConnection, SourceVmDetail, SourceVmRecord, VmStatus};

/// `_type` discriminator of the detail section carrying NIC data.
pub const NETWORK_CONNECTION_SECTION: &str = "NetworkConnectionSectionType";

/// Header carrying the bearer token in the session handshake response.
pub const ACCESS_TOKEN_HEADER: &str = "X-VMWARE-VCLOUD-ACCESS-TOKEN";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Connection / Config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration for connecting to a Cloud Director endpoint.
#[derive(Clone)]
pub struct VcloudConfig {
    /// Base URL including scheme (e.g. "https://vcd.example.com")
    pub host: String,
    pub username: String,
    pub password: String,
    /// API version advertised in Accept headers
    pub api_version: String,
    /// Skip TLS certificate verification (self-signed labs)
    pub insecure: bool,
    /// Request timeout in seconds, 0 disables it
    pub timeout_secs: u64,
}

impl Default for VcloudConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            api_version: "38.1".into(),
            insecure: false,
            timeout_secs: 30,
        }
    }
}

// Keeps the password out of log lines and panic messages.
impl fmt::Debug for VcloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcloudConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("insecure", &self.insecure)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Query endpoint (/api/query?type=vm&format=records)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One page of query results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResultRecords {
    #[serde(default)]
    pub record: Option<Vec<VmQueryRecord>>,
}

/// VM row as returned by the query service. Every field except the name is
/// optional on the wire and may be `null`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmQueryRecord {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub number_of_cpus: Option<u32>,
    #[serde(default, rename = "memoryMB")]
    pub memory_mb: Option<u64>,
    #[serde(default)]
    pub total_storage_allocated_mb: Option<u64>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default, rename = "isVAppTemplate")]
    pub is_vapp_template: Option<bool>,
}

impl From<VmQueryRecord> for SourceVmRecord {
    fn from(r: VmQueryRecord) -> Self {
        Self {
            name: r.name,
            status: VmStatus::from(r.status.unwrap_or_default()),
            vcpus: r.number_of_cpus.unwrap_or(0),
            memory_mb: r.memory_mb.unwrap_or(0),
            disk_mb: r.total_storage_allocated_mb.unwrap_or(0),
            is_template: r.is_vapp_template.unwrap_or(false),
            detail_ref: r.href.unwrap_or_default(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VM detail document
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Only the sections are read; the VM name is already known from the query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VmDocument {
    #[serde(default)]
    pub section: Option<Vec<VmSection>>,
}

/// A typed section of the VM document. Only the network-connection section
/// is decoded; other section bodies are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmSection {
    #[serde(default, rename = "_type")]
    pub section_type: String,
    #[serde(default)]
    pub network_connection: Option<Vec<NetworkConnectionEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConnectionEntry {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub external_ip_address: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
}

impl From<NetworkConnectionEntry> for NetworkConnection {
    fn from(e: NetworkConnectionEntry) -> Self {
        Self {
            ip_address: e.ip_address.unwrap_or_default(),
            external_ip: e.external_ip_address.unwrap_or_default(),
            mac_address: e.mac_address.unwrap_or_default(),
            network: e.network.unwrap_or_default(),
        }
    }
}

impl VmDocument {
    /// Connections from the first network-connection section; none when the
    /// section is absent.
    pub fn into_detail(self) -> SourceVmDetail {
        let connections = self
            .section
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.section_type == NETWORK_CONNECTION_SECTION)
            .and_then(|s| s.network_connection)
            .unwrap_or_default()
            .into_iter()
            .map(NetworkConnection::from)
            .collect();

        SourceVmDetail { connections }
    }
}
