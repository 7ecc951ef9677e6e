//! The two seams the reconciliation engine is generic over.
//!
//! `vmsync-vcloud` and `vmsync-netbox` provide the production
//! implementations; tests substitute recording fakes.

use crate::error::InventoryResult;
use crate::types::{SourceVmDetail, SourceVmRecord, VmRecordSpec};
use async_trait::async_trait;

/// Read-only access to the platform the VMs live on.
#[async_trait]
pub trait SourceInventory: Send + Sync {
    /// Exchange static credentials for a session token.
    async fn authenticate(&mut self) -> InventoryResult<()>;

    /// Minimal read call confirming the session is usable.
    async fn verify_access(&self) -> InventoryResult<()>;

    /// One page of VM summaries. `page` is 1-indexed; an empty vector means
    /// there are no more pages.
    async fn list_page(&self, page: u32, page_size: u32) -> InventoryResult<Vec<SourceVmRecord>>;

    /// Full detail for one VM by its opaque reference.
    async fn get_detail(&self, reference: &str) -> InventoryResult<SourceVmDetail>;

    /// Best-effort session teardown.
    async fn logout(&mut self) {}
}

/// Write access to the asset-management system.
#[async_trait]
pub trait DestinationInventory: Send + Sync {
    async fn verify_access(&self) -> InventoryResult<()>;

    /// Identifier of the first VM whose name matches exactly.
    async fn find_vm_by_name(&self, name: &str) -> InventoryResult<Option<u64>>;

    async fn create_vm(&self, spec: &VmRecordSpec) -> InventoryResult<u64>;

    async fn update_vm(&self, id: u64, spec: &VmRecordSpec) -> InventoryResult<()>;

    async fn create_interface(&self, vm_id: u64) -> InventoryResult<u64>;

    /// `address` is already in `ip/prefix` form.
    async fn create_ip_address(&self, interface_id: u64, address: &str) -> InventoryResult<u64>;
}
