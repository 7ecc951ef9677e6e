//! Reconciliation engine.
//!
//! `Reconciler` walks every page of the source inventory, filters out the
//! VMs that should not be mirrored, and for each remaining VM upserts the
//! destination record, then creates one interface and its IP records per
//! network connection.
//!
//! Everything runs sequentially: one outstanding call at a time, with a
//! fixed pause after each processed VM.

use crate::config::{SyncSettings, UpsertMode};
use crate::error::SyncError;
use crate::report::SyncReport;

use log::{debug, error, info, warn};
use vmsync_core::{
    DestinationInventory, NetworkConnection, SourceInventory, SourceVmRecord, VmRecordSpec,
    VmStatus,
};

/// Why a VM was left out of the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Template,
    PoweredOff,
}

impl SkipReason {
    fn describe(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::PoweredOff => "powered off",
        }
    }
}

pub struct Reconciler<'a, S, D> {
    source: &'a mut S,
    destination: &'a D,
    settings: &'a SyncSettings,
    report: SyncReport,
}

impl<'a, S, D> Reconciler<'a, S, D>
where
    S: SourceInventory,
    D: DestinationInventory,
{
    pub fn new(source: &'a mut S, destination: &'a D, settings: &'a SyncSettings) -> Self {
        Self {
            source,
            destination,
            settings,
            report: SyncReport::default(),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Authenticate against the source and check both backends respond.
    /// Nothing is written before this succeeds.
    pub async fn startup(&mut self) -> Result<(), SyncError> {
        info!("=== Starting synchronisation ===");

        if let Err(e) = self.source.authenticate().await {
            error!("vCloud authentication failed: {e}");
            return Err(SyncError::Startup(e));
        }
        if let Err(e) = self.source.verify_access().await {
            error!("vCloud connectivity check failed: {e}");
            return Err(SyncError::Startup(e));
        }
        info!("vCloud connection OK");

        if let Err(e) = self.destination.verify_access().await {
            error!("NetBox connectivity check failed: {e}");
            return Err(SyncError::Startup(e));
        }
        info!("NetBox connection OK");
        Ok(())
    }

    /// One full pass over the source inventory.
    pub async fn run(&mut self) -> Result<SyncReport, SyncError> {
        self.report = SyncReport::default();
        let mut page = 1;

        loop {
            let vms = match self.source.list_page(page, self.settings.page_size).await {
                Ok(vms) => vms,
                Err(e) => {
                    error!("vCloud: listing page {page} failed: {e}");
                    return Err(SyncError::Source(e));
                }
            };
            self.report.pages_fetched += 1;
            if vms.is_empty() {
                debug!("vCloud: page {page} is empty, paging done");
                break;
            }
            debug!("vCloud: page {page} returned {} VMs", vms.len());

            for vm in &vms {
                self.report.vms_seen += 1;
                self.sync_vm(vm).await?;
            }
            page += 1;
        }

        info!("=== Synchronisation complete ===");
        info!("{}", self.report);
        Ok(std::mem::take(&mut self.report))
    }

    pub async fn shutdown(&mut self) {
        self.source.logout().await;
    }

    // ── Per VM ──────────────────────────────────────────────────────

    pub fn skip_reason(&self, vm: &SourceVmRecord) -> Option<SkipReason> {
        if vm.is_template && !self.settings.include_templates {
            return Some(SkipReason::Template);
        }
        if vm.status == VmStatus::PoweredOff && !self.settings.include_powered_off {
            return Some(SkipReason::PoweredOff);
        }
        None
    }

    async fn sync_vm(&mut self, vm: &SourceVmRecord) -> Result<(), SyncError> {
        if let Some(reason) = self.skip_reason(vm) {
            info!("Skipping {} ({})", vm.name, reason.describe());
            match reason {
                SkipReason::Template => self.report.skipped_templates += 1,
                SkipReason::PoweredOff => self.report.skipped_powered_off += 1,
            }
            return Ok(());
        }

        let detail = match self.source.get_detail(&vm.detail_ref).await {
            Ok(detail) => detail,
            Err(e) => {
                error!("vCloud: fetching detail for {} failed: {e}", vm.name);
                return Err(SyncError::Source(e));
            }
        };
        self.report.vms_processed += 1;

        if detail.connections.is_empty() {
            info!("vCloud: {} has no network connections", vm.name);
        }

        match self.settings.upsert_mode {
            UpsertMode::PerConnection => {
                for conn in &detail.connections {
                    self.log_connection(vm, conn);
                    self.report.connections += 1;
                    let spec = VmRecordSpec::from_source(vm, conn);
                    if let Some(vm_id) = self.upsert_vm(&spec).await {
                        self.attach(&vm.name, vm_id, conn).await;
                    }
                }
            }
            UpsertMode::PerVm => {
                // Record facts come from the first connection.
                let vm_id = match detail.connections.first() {
                    Some(first) => self.upsert_vm(&VmRecordSpec::from_source(vm, first)).await,
                    None => None,
                };
                for conn in &detail.connections {
                    self.log_connection(vm, conn);
                    self.report.connections += 1;
                    if let Some(vm_id) = vm_id {
                        self.attach(&vm.name, vm_id, conn).await;
                    }
                }
            }
        }

        if !self.settings.pace.is_zero() {
            tokio::time::sleep(self.settings.pace).await;
        }
        Ok(())
    }

    fn log_connection(&self, vm: &SourceVmRecord, conn: &NetworkConnection) {
        info!(
            "vCloud: {} | {} | CPU: {} | RAM: {} MB | Disk: {} MB | IP: {} | Ext: {} | MAC: {} | Net: {}",
            vm.name,
            vm.status,
            vm.vcpus,
            vm.memory_mb,
            vm.disk_mb,
            conn.ip_address,
            conn.external_ip,
            conn.mac_address,
            conn.network
        );
    }

    // ── Destination writes ──────────────────────────────────────────

    /// Find by name, then update or create. `None` when there is no record
    /// to attach interfaces to.
    async fn upsert_vm(&mut self, spec: &VmRecordSpec) -> Option<u64> {
        let existing = match self.destination.find_vm_by_name(&spec.name).await {
            Ok(found) => found,
            Err(e) => {
                error!("NetBox: lookup of VM {} failed: {e}", spec.name);
                self.report.failures += 1;
                return None;
            }
        };

        match existing {
            Some(id) => {
                match self.destination.update_vm(id, spec).await {
                    Ok(()) => {
                        info!("NetBox: updated VM {} (id {id})", spec.name);
                        self.report.vms_updated += 1;
                    }
                    Err(e) => {
                        warn!("NetBox: update of VM {} (id {id}) failed: {e}", spec.name);
                        self.report.failures += 1;
                    }
                }
                Some(id)
            }
            None => match self.destination.create_vm(spec).await {
                Ok(id) => {
                    info!("NetBox: created VM {} (id {id})", spec.name);
                    self.report.vms_created += 1;
                    Some(id)
                }
                Err(e) => {
                    error!("NetBox: creating VM {} failed: {e}", spec.name);
                    self.report.failures += 1;
                    None
                }
            },
        }
    }

    /// One interface for the connection, then one IP per assigned address.
    async fn attach(&mut self, vm_name: &str, vm_id: u64, conn: &NetworkConnection) {
        let interface_id = match self.destination.create_interface(vm_id).await {
            Ok(id) => {
                info!("NetBox: interface {id} created for {vm_name}");
                self.report.interfaces_created += 1;
                id
            }
            Err(e) => {
                error!("NetBox: creating interface for {vm_name} failed: {e}");
                self.report.failures += 1;
                return;
            }
        };

        for (role, addr) in conn.addresses() {
            let address = format!("{addr}/{}", self.settings.ip_prefix_length);
            match self.destination.create_ip_address(interface_id, &address).await {
                Ok(_) => {
                    info!("NetBox: {} {address} assigned to {vm_name}", role.label());
                    self.report.ips_created += 1;
                }
                Err(e) => {
                    error!("NetBox: creating {} {address} for {vm_name} failed: {e}", role.label());
                    self.report.failures += 1;
                }
            }
        }
    }
}
