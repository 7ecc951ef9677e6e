//! Connection config and request / response bodies for the NetBox REST API.

use serde::{Deserialize, Serialize};
use std::fmt;
use vmsync_core::{VmContext, VmRecordSpec};

/// Status NetBox records are written with, whatever the source reports.
pub const ACTIVE_STATUS: &str = "active";

/// Comment attached to VMs created by the sync.
pub const SYNC_COMMENT: &str = "auto sync from cloud";

/// Object type used when assigning an IP to a VM interface.
pub const VM_INTERFACE_OBJECT_TYPE: &str = "virtualization.vminterface";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Connection / Config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration for the NetBox API.
#[derive(Clone)]
pub struct NetboxConfig {
    /// API root (e.g. "https://netbox.example.com/api")
    pub url: String,
    pub token: String,
    /// Foreign keys applied to created VMs; 0 means unset
    pub site: u64,
    pub cluster: u64,
    pub role: u64,
    pub tenant: u64,
    pub platform: u64,
    pub interface: InterfaceDefaults,
    /// Request timeout in seconds, 0 disables it
    pub timeout_secs: u64,
}

impl Default for NetboxConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            site: 0,
            cluster: 0,
            role: 0,
            tenant: 0,
            platform: 0,
            interface: InterfaceDefaults::default(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for NetboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetboxConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("site", &self.site)
            .field("cluster", &self.cluster)
            .field("role", &self.role)
            .field("tenant", &self.tenant)
            .field("platform", &self.platform)
            .field("interface", &self.interface)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Fixed attributes of every VM interface the sync creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDefaults {
    pub name: String,
    pub mtu: u32,
    pub mode: String,
}

impl Default for InterfaceDefaults {
    fn default() -> Self {
        Self {
            name: "eth0".into(),
            mtu: 65536,
            mode: "access".into(),
        }
    }
}

fn non_zero(id: u64) -> Option<u64> {
    (id != 0).then_some(id)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Requests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /virtualization/virtual-machines/
#[derive(Debug, Clone, Serialize)]
pub struct VmCreateRequest<'a> {
    pub name: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<u64>,
    pub vcpus: u32,
    pub memory: u64,
    pub disk: u64,
    pub comments: &'static str,
    pub local_context_data: &'a VmContext,
}

impl<'a> VmCreateRequest<'a> {
    pub fn new(config: &NetboxConfig, spec: &'a VmRecordSpec) -> Self {
        Self {
            name: &spec.name,
            status: ACTIVE_STATUS,
            site: non_zero(config.site),
            cluster: non_zero(config.cluster),
            role: non_zero(config.role),
            tenant: non_zero(config.tenant),
            platform: non_zero(config.platform),
            vcpus: spec.vcpus,
            memory: spec.memory_mb,
            disk: spec.disk_mb,
            comments: SYNC_COMMENT,
            local_context_data: &spec.context,
        }
    }
}

/// PATCH /virtualization/virtual-machines/{id}/
#[derive(Debug, Clone, Serialize)]
pub struct VmUpdateRequest<'a> {
    pub status: &'static str,
    pub vcpus: u32,
    pub memory: u64,
    pub disk: u64,
    pub local_context_data: &'a VmContext,
}

impl<'a> From<&'a VmRecordSpec> for VmUpdateRequest<'a> {
    fn from(spec: &'a VmRecordSpec) -> Self {
        Self {
            status: ACTIVE_STATUS,
            vcpus: spec.vcpus,
            memory: spec.memory_mb,
            disk: spec.disk_mb,
            local_context_data: &spec.context,
        }
    }
}

/// POST /virtualization/interfaces/
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceCreateRequest<'a> {
    pub virtual_machine: u64,
    pub name: &'a str,
    pub enabled: bool,
    pub mtu: u32,
    pub mode: &'a str,
}

/// POST /ipam/ip-addresses/
#[derive(Debug, Clone, Serialize)]
pub struct IpAddressCreateRequest<'a> {
    pub status: &'static str,
    pub assigned_object_type: &'static str,
    pub assigned_object_id: u64,
    pub address: &'a str,
    pub family: u8,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Responses
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Paginated list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Any object body; only the identifier is read.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub id: Option<u64>,
}
