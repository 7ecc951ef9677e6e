//! # vmsync
//!
//! Mirrors the virtual machines of a VMware Cloud Director tenant into
//! NetBox: one VM record per source VM, plus an interface and IP address
//! records per network connection.
//!
//! ## Modules
//!
//! - **config** - Environment-driven `SyncConfig`
//! - **engine** - `Reconciler`, the paging/filter/upsert loop
//! - **error** - `SyncError` for conditions that end the run
//! - **logging** - stdout + append-mode log file subscriber
//! - **report** - Per-run counters

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod report;

pub use config::{SyncConfig, SyncSettings, UpsertMode};
pub use engine::Reconciler;
pub use error::SyncError;
pub use report::SyncReport;

use vmsync_netbox::NetboxClient;
use vmsync_vcloud::VcloudClient;

/// Read configuration and install logging. Failures here happen before any
/// log output exists, so callers report them on stderr.
pub fn bootstrap() -> Result<SyncConfig, SyncError> {
    let config = SyncConfig::from_env()?;
    logging::init(&config.log_file)?;
    Ok(config)
}

/// Build both clients from `config` and run one full pass.
pub async fn sync(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    let mut source = VcloudClient::new(&config.vcloud).map_err(SyncError::Startup)?;
    let destination = NetboxClient::new(&config.netbox).map_err(SyncError::Startup)?;

    let mut reconciler = Reconciler::new(&mut source, &destination, &config.settings);
    reconciler.startup().await?;
    let outcome = reconciler.run().await;
    reconciler.shutdown().await;
    outcome
}
