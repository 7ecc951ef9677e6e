//! Counters collected over one reconciliation pass.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub pages_fetched: u32,
    pub vms_seen: u32,
    pub skipped_templates: u32,
    pub skipped_powered_off: u32,
    pub vms_processed: u32,
    pub connections: u32,
    pub vms_created: u32,
    pub vms_updated: u32,
    pub interfaces_created: u32,
    pub ips_created: u32,
    /// Destination writes or lookups that failed and were skipped.
    pub failures: u32,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} VMs seen ({} processed, {} templates skipped, {} powered-off skipped), \
             {} connections: {} created, {} updated, {} interfaces, {} IPs, {} failures",
            self.vms_seen,
            self.vms_processed,
            self.skipped_templates,
            self.skipped_powered_off,
            self.connections,
            self.vms_created,
            self.vms_updated,
            self.interfaces_created,
            self.ips_created,
            self.failures
        )
    }
}
