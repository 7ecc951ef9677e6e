//! # vmsync – NetBox destination
//!
//! Writes VMs, VM interfaces and IP address assignments into NetBox.
//!
//! ## Modules
//!
//! - **types** - Config, interface defaults and request / response bodies
//! - **client** - Token-authenticated HTTP client; implements
//!   `DestinationInventory`

pub mod client;
pub mod types;

pub use client::NetboxClient;
pub use types::{InterfaceDefaults, NetboxConfig};
