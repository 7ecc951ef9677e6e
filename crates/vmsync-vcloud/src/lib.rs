//! # vmsync – VMware Cloud Director source
//!
//! Reads the VM inventory of a Cloud Director organisation.
//!
//! ## Modules
//!
//! - **types** - Connection config and query / detail wire types
//! - **client** - HTTP client with session login, paged VM query and
//!   per-VM detail fetch; implements `SourceInventory`

pub mod client;
pub mod types;

pub use client::VcloudClient;
pub use types::VcloudConfig;
