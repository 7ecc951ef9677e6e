//! NetBox REST client.
//!
//! Token-authenticated JSON calls against the `virtualization` and `ipam`
//! endpoints. Every write is a single request; nothing is retried.

use crate::types::*;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use vmsync_core::{DestinationInventory, InventoryError, InventoryResult, VmRecordSpec};

/// NetBox API client.
#[derive(Debug)]
pub struct NetboxClient {
    http: Client,
    /// API root without trailing slash.
    base_url: String,
    config: NetboxConfig,
}

impl NetboxClient {
    pub fn new(config: &NetboxConfig) -> InventoryResult<Self> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder
            .build()
            .map_err(|e| InventoryError::connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    // ── Connectivity ─────────────────────────────────────────────────

    /// GET on the API root; anything but 200 means the token or URL is bad.
    pub async fn test_connection(&self) -> InventoryResult<()> {
        let resp = self.request(self.http.get(format!("{}/", self.base_url))).await?;
        if resp.status() != StatusCode::OK {
            return Err(InventoryError::connection(format!(
                "NetBox access check failed (HTTP {})",
                resp.status().as_u16()
            )));
        }
        info!("NetBox access confirmed");
        Ok(())
    }

    // ── Virtual machines ─────────────────────────────────────────────

    /// Id of the first VM whose name matches exactly.
    pub async fn find_vm(&self, name: &str) -> InventoryResult<Option<u64>> {
        let url = format!("{}/virtualization/virtual-machines/", self.base_url);
        let resp = self.request(self.http.get(url).query(&[("name", name)])).await?;
        let resp = Self::check_status(resp).await?;
        let page: Paginated<ObjectRef> = Self::parse_response(resp).await?;
        debug!("NetBox lookup for {name}: {} match(es)", page.results.len());
        Ok(page.results.into_iter().next().and_then(|r| r.id))
    }

    /// Create a VM; only HTTP 201 counts as success.
    pub async fn create_vm(&self, spec: &VmRecordSpec) -> InventoryResult<u64> {
        let url = format!("{}/virtualization/virtual-machines/", self.base_url);
        let body = VmCreateRequest::new(&self.config, spec);
        let resp = self.request(self.http.post(url).json(&body)).await?;
        Self::expect_created(resp, "VM").await
    }

    pub async fn update_vm(&self, id: u64, spec: &VmRecordSpec) -> InventoryResult<()> {
        let url = format!("{}/virtualization/virtual-machines/{id}/", self.base_url);
        let body = VmUpdateRequest::from(spec);
        let resp = self.request(self.http.patch(url).json(&body)).await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    // ── Interfaces / IPAM ────────────────────────────────────────────

    pub async fn create_interface(&self, vm_id: u64) -> InventoryResult<u64> {
        let url = format!("{}/virtualization/interfaces/", self.base_url);
        let iface = &self.config.interface;
        let body = InterfaceCreateRequest {
            virtual_machine: vm_id,
            name: &iface.name,
            enabled: true,
            mtu: iface.mtu,
            mode: &iface.mode,
        };
        let resp = self.request(self.http.post(url).json(&body)).await?;
        Self::expect_created(resp, "interface").await
    }

    /// Assign an IPv4 address (`ip/prefix`) to a VM interface.
    pub async fn create_ip(&self, interface_id: u64, address: &str) -> InventoryResult<u64> {
        let url = format!("{}/ipam/ip-addresses/", self.base_url);
        let body = IpAddressCreateRequest {
            status: ACTIVE_STATUS,
            assigned_object_type: VM_INTERFACE_OBJECT_TYPE,
            assigned_object_id: interface_id,
            address,
            family: 4,
        };
        let resp = self.request(self.http.post(url).json(&body)).await?;
        Self::expect_created(resp, "IP address").await
    }

    // ── Internal helpers ─────────────────────────────────────────────

    async fn request(&self, builder: RequestBuilder) -> InventoryResult<Response> {
        let resp = builder
            .header(header::AUTHORIZATION, format!("Token {}", self.config.token))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        Ok(resp)
    }

    async fn expect_created(resp: Response, what: &str) -> InventoryResult<u64> {
        if resp.status() != StatusCode::CREATED {
            let code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(InventoryError::api(code, format!("NetBox {what} create failed: {body}")));
        }
        let created: ObjectRef = Self::parse_response(resp).await?;
        created
            .id
            .ok_or_else(|| InventoryError::missing_id(format!("NetBox {what} response carried no id")))
    }

    async fn check_status(resp: Response) -> InventoryResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(InventoryError::auth(format!("NetBox rejected the token: {body}")))
            }
            StatusCode::NOT_FOUND => Err(InventoryError::not_found(format!("NetBox object not found: {body}"))),
            _ => Err(InventoryError::api(code, format!("NetBox API error {code}: {body}"))),
        }
    }

    async fn parse_response<T: DeserializeOwned>(resp: Response) -> InventoryResult<T> {
        let text = resp
            .text()
            .await
            .map_err(|e| InventoryError::parse(format!("Failed to read response body: {e}")))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl DestinationInventory for NetboxClient {
    async fn verify_access(&self) -> InventoryResult<()> {
        self.test_connection().await
    }

    async fn find_vm_by_name(&self, name: &str) -> InventoryResult<Option<u64>> {
        self.find_vm(name).await
    }

    async fn create_vm(&self, spec: &VmRecordSpec) -> InventoryResult<u64> {
        NetboxClient::create_vm(self, spec).await
    }

    async fn update_vm(&self, id: u64, spec: &VmRecordSpec) -> InventoryResult<()> {
        NetboxClient::update_vm(self, id, spec).await
    }

    async fn create_interface(&self, vm_id: u64) -> InventoryResult<u64> {
        NetboxClient::create_interface(self, vm_id).await
    }

    async fn create_ip_address(&self, interface_id: u64, address: &str) -> InventoryResult<u64> {
        self.create_ip(interface_id, address).await
    }
}
