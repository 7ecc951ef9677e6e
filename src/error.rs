//! Run-level errors.
//!
//! Only conditions that end the run live here. Per-record destination
//! failures are logged by the engine and counted in the report instead.

use crate::config::ConfigError;
use thiserror::Error;
use vmsync_core::InventoryError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    /// Authentication or connectivity check failed before anything was
    /// written.
    #[error("startup check failed: {0}")]
    Startup(InventoryError),

    /// The source inventory could not be read mid-pass.
    #[error("source inventory read failed: {0}")]
    Source(InventoryError),
}

impl SyncError {
    pub fn exit_code(&self) -> u8 {
        1
    }
}
