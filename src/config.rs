//! Process configuration.
//!
//! Built once at startup from environment variables (optionally seeded from
//! a `.env` file) and passed by reference to the clients and the engine.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use vmsync_netbox::{InterfaceDefaults, NetboxConfig};
use vmsync_vcloud::VcloudConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// How often the destination VM record is looked up and written for a VM
/// with several network connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpsertMode {
    /// Lookup + create/update once per connection (historical behaviour).
    #[default]
    PerConnection,
    /// Lookup + create/update once per VM; only interfaces and IPs fan out.
    PerVm,
}

impl FromStr for UpsertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-connection" | "connection" => Ok(Self::PerConnection),
            "per-vm" | "vm" => Ok(Self::PerVm),
            other => Err(format!("expected per-connection or per-vm, got {other}")),
        }
    }
}

/// Engine behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub include_templates: bool,
    pub include_powered_off: bool,
    pub page_size: u32,
    /// Delay after each processed VM.
    pub pace: Duration,
    pub upsert_mode: UpsertMode,
    /// Prefix length appended to every address written to the destination.
    pub ip_prefix_length: u8,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            include_templates: false,
            include_powered_off: false,
            page_size: 25,
            pace: Duration::from_millis(1000),
            upsert_mode: UpsertMode::PerConnection,
            ip_prefix_length: 24,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub vcloud: VcloudConfig,
    pub netbox: NetboxConfig,
    pub settings: SyncSettings,
    pub log_file: PathBuf,
}

impl SyncConfig {
    /// Read `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);
        let timeout_secs = env.parse_or("HTTP_TIMEOUT_SECS", 30u64)?;

        let vcloud = VcloudConfig {
            host: env.required("VCLOUD_HOST")?,
            username: env.required("VCLOUD_USER")?,
            password: env.required("VCLOUD_PASS")?,
            api_version: env.get("VCLOUD_API_VERSION").unwrap_or_else(|| "38.1".into()),
            insecure: env.flag("VCLOUD_INSECURE"),
            timeout_secs,
        };

        let interface_defaults = InterfaceDefaults::default();
        let netbox = NetboxConfig {
            url: env.required("NETBOX_URL")?,
            token: env.required("NETBOX_TOKEN")?,
            site: env.parse_or("NETBOX_SITE", 0)?,
            cluster: env.parse_or("NETBOX_CLUSTER", 0)?,
            role: env.parse_or("NETBOX_ROLE", 0)?,
            tenant: env.parse_or("NETBOX_TENANT", 0)?,
            platform: env.parse_or("NETBOX_PLATFORM", 0)?,
            interface: InterfaceDefaults {
                name: env.get("NETBOX_IFACE_NAME").unwrap_or(interface_defaults.name),
                mtu: env.parse_or("NETBOX_IFACE_MTU", interface_defaults.mtu)?,
                mode: env.get("NETBOX_IFACE_MODE").unwrap_or(interface_defaults.mode),
            },
            timeout_secs,
        };

        let defaults = SyncSettings::default();
        let ip_prefix_length: u8 = env.parse_or("NETBOX_IP_PREFIX", defaults.ip_prefix_length)?;
        if ip_prefix_length > 32 {
            return Err(ConfigError::Invalid {
                key: "NETBOX_IP_PREFIX",
                value: ip_prefix_length.to_string(),
                reason: "IPv4 prefix length must be 0-32".into(),
            });
        }
        let page_size: u32 = env.parse_or("SYNC_PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_PAGE_SIZE",
                value: "0".into(),
                reason: "page size must be positive".into(),
            });
        }

        let settings = SyncSettings {
            include_templates: env.flag("SYNC_TEMPLATES"),
            include_powered_off: env.flag("SYNC_POWEROFF"),
            page_size,
            pace: Duration::from_millis(env.parse_or("SYNC_PACE_MS", 1000u64)?),
            upsert_mode: env.parse_or("SYNC_UPSERT_MODE", defaults.upsert_mode)?,
            ip_prefix_length,
        };

        Ok(Self {
            vcloud,
            netbox,
            settings,
            log_file: env
                .get("SYNC_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("sync_vms.log")),
        })
    }
}

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    /// Only a case-insensitive "true" enables a flag.
    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
