//! Inventory records exchanged between the source client, the engine and
//! the destination client.

use serde::Serialize;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Source side
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Lifecycle status as reported by the source platform.
///
/// Unrecognised values are kept verbatim so they can be mirrored into the
/// destination's context blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmStatus {
    PoweredOn,
    PoweredOff,
    Other(String),
}

impl VmStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PoweredOn => "POWERED_ON",
            Self::PoweredOff => "POWERED_OFF",
            Self::Other(s) => s,
        }
    }
}

impl Default for VmStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<&str> for VmStatus {
    fn from(s: &str) -> Self {
        match s {
            "POWERED_ON" => Self::PoweredOn,
            "POWERED_OFF" => Self::PoweredOff,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for VmStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl std::fmt::Display for VmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One VM summary from a page of the source inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceVmRecord {
    pub name: String,
    pub status: VmStatus,
    pub vcpus: u32,
    pub memory_mb: u64,
    pub disk_mb: u64,
    /// Template rather than a live instance.
    pub is_template: bool,
    /// Opaque reference used to fetch the full detail document.
    pub detail_ref: String,
}

/// A single network attachment of a VM. Empty strings mean "not assigned".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConnection {
    pub ip_address: String,
    pub external_ip: String,
    pub mac_address: String,
    pub network: String,
}

impl NetworkConnection {
    /// Assigned addresses in write order (internal first), empty ones dropped.
    pub fn addresses(&self) -> impl Iterator<Item = (AddressRole, &str)> {
        [
            (AddressRole::Internal, self.ip_address.as_str()),
            (AddressRole::External, self.external_ip.as_str()),
        ]
        .into_iter()
        .filter(|(_, addr)| !addr.is_empty())
    }
}

/// Which side of a connection an address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    Internal,
    External,
}

impl AddressRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::Internal => "IP",
            Self::External => "external IP",
        }
    }
}

/// Full detail for one VM. Only the network connections are retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceVmDetail {
    pub connections: Vec<NetworkConnection>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Destination side
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Last-known network facts stored in the destination record's free-form
/// context blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VmContext {
    pub ip_address: String,
    pub external_ip: String,
    pub mac: String,
    pub network: String,
    pub cloud_status: String,
}

/// Field set proposed for a destination VM on create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmRecordSpec {
    pub name: String,
    pub vcpus: u32,
    pub memory_mb: u64,
    pub disk_mb: u64,
    pub context: VmContext,
}

impl VmRecordSpec {
    /// Map a source summary plus one of its connections into a destination
    /// record. The source status only survives inside the context blob.
    pub fn from_source(vm: &SourceVmRecord, conn: &NetworkConnection) -> Self {
        Self {
            name: vm.name.clone(),
            vcpus: vm.vcpus,
            memory_mb: vm.memory_mb,
            disk_mb: vm.disk_mb,
            context: VmContext {
                ip_address: conn.ip_address.clone(),
                external_ip: conn.external_ip.clone(),
                mac: conn.mac_address.clone(),
                network: conn.network.clone(),
                cloud_status: vm.status.as_str().to_string(),
            },
        }
    }
}
