//! # vmsync – core
//!
//! Shared building blocks for the VM inventory sync.
//!
//! ## Modules
//!
//! - **types** - Source and destination records, field mapping
//! - **inventory** - `SourceInventory` / `DestinationInventory` traits
//! - **error** - Shared error type for both inventory clients

pub mod error;
pub mod inventory;
pub mod types;

pub use error::{InventoryError, InventoryErrorKind, InventoryResult};
pub use inventory::{DestinationInventory, SourceInventory};
pub use types::*;
