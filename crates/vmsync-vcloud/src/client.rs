//! Cloud Director HTTP client with token-based sessions.
//!
//! The session is opened against `/cloudapi/1.0.0/sessions`; every later
//! request is a bearer-authenticated GET against the legacy `/api` tree.

use crate::types::*;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use vmsync_core::{InventoryError, InventoryResult, SourceInventory, SourceVmDetail, SourceVmRecord};

/// Cloud Director API client.
pub struct VcloudClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    config: VcloudConfig,
}

impl VcloudClient {
    /// Build a new client from config (does NOT log in yet).
    pub fn new(config: &VcloudConfig) -> InventoryResult<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(config.insecure);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| InventoryError::connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            token: None,
            config: config.clone(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.token.is_some()
    }

    // ── Session management ──────────────────────────────────────────

    /// Open a session (POST /cloudapi/1.0.0/sessions). Only HTTP 200 with a
    /// non-empty access-token header counts as success.
    pub async fn login(&mut self) -> InventoryResult<()> {
        let url = format!("{}/cloudapi/1.0.0/sessions", self.base_url);

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(header::ACCEPT, format!("application/*;version={}", self.config.api_version))
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(InventoryError::auth(format!(
                "vCloud login failed (HTTP {})",
                resp.status().as_u16()
            )));
        }

        let token = resp
            .headers()
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| InventoryError::auth("Access token missing from vCloud login response"))?;

        self.token = Some(token.to_string());
        info!("vCloud authentication succeeded");
        Ok(())
    }

    /// Drop the current session (DELETE /cloudapi/1.0.0/sessions/current).
    pub async fn logout(&mut self) {
        if let Some(ref token) = self.token {
            let url = format!("{}/cloudapi/1.0.0/sessions/current", self.base_url);
            let _ = self
                .client
                .delete(&url)
                .bearer_auth(token)
                .header(header::ACCEPT, self.json_accept())
                .send()
                .await;
        }
        self.token = None;
    }

    /// Smallest possible query to prove the session works.
    pub async fn test_connection(&self) -> InventoryResult<()> {
        let resp = self.query_vms(1, 1).await?;
        if resp.status() != StatusCode::OK {
            return Err(InventoryError::connection(format!(
                "vCloud access check failed (HTTP {})",
                resp.status().as_u16()
            )));
        }
        info!("vCloud access confirmed");
        Ok(())
    }

    // ── Inventory ───────────────────────────────────────────────────

    /// One page of VM records. HTTP 400 marks the end of the result set.
    pub async fn list_vms(&self, page: u32, page_size: u32) -> InventoryResult<Vec<SourceVmRecord>> {
        let resp = self.query_vms(page, page_size).await?;

        if resp.status() == StatusCode::BAD_REQUEST {
            debug!("vCloud page {page} is past the end of the result set");
            return Ok(Vec::new());
        }

        let resp = Self::check_status(resp).await?;
        let records: QueryResultRecords = Self::parse_response(resp).await?;
        Ok(records
            .record
            .unwrap_or_default()
            .into_iter()
            .map(SourceVmRecord::from)
            .collect())
    }

    /// Fetch the VM document behind an `href` from the query results.
    pub async fn get_vm_details(&self, href: &str) -> InventoryResult<SourceVmDetail> {
        let token = self.require_token()?;
        let resp = self
            .client
            .get(href)
            .bearer_auth(token)
            .header(header::ACCEPT, self.json_accept())
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let doc: VmDocument = Self::parse_response(resp).await?;
        Ok(doc.into_detail())
    }

    // ── HTTP helpers ────────────────────────────────────────────────

    fn require_token(&self) -> InventoryResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| InventoryError::auth("Not logged in to vCloud"))
    }

    fn json_accept(&self) -> String {
        format!("application/*+json;version={}", self.config.api_version)
    }

    async fn query_vms(&self, page: u32, page_size: u32) -> InventoryResult<Response> {
        let token = self.require_token()?;
        let url = format!("{}/api/query", self.base_url);
        let page = page.to_string();
        let page_size = page_size.to_string();
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(header::ACCEPT, self.json_accept())
            .query(&[
                ("type", "vm"),
                ("page", page.as_str()),
                ("pageSize", page_size.as_str()),
                ("format", "records"),
            ])
            .send()
            .await?;
        Ok(resp)
    }

    async fn check_status(resp: Response) -> InventoryResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => Err(InventoryError::auth(format!("vCloud session rejected: {body}"))),
            StatusCode::NOT_FOUND => Err(InventoryError::not_found(format!("vCloud resource not found: {body}"))),
            _ => Err(InventoryError::api(code, format!("vCloud API error {code}: {body}"))),
        }
    }

    async fn parse_response<T: DeserializeOwned>(resp: Response) -> InventoryResult<T> {
        let text = resp
            .text()
            .await
            .map_err(|e| InventoryError::parse(format!("Failed to read response body: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            let cut = text.char_indices().nth(500).map(|(i, _)| i).unwrap_or(text.len());
            InventoryError::parse(format!("JSON parse error: {e}; body: {}", &text[..cut]))
        })
    }
}

#[async_trait]
impl SourceInventory for VcloudClient {
    async fn authenticate(&mut self) -> InventoryResult<()> {
        self.login().await
    }

    async fn verify_access(&self) -> InventoryResult<()> {
        self.test_connection().await
    }

    async fn list_page(&self, page: u32, page_size: u32) -> InventoryResult<Vec<SourceVmRecord>> {
        self.list_vms(page, page_size).await
    }

    async fn get_detail(&self, reference: &str) -> InventoryResult<SourceVmDetail> {
        self.get_vm_details(reference).await
    }

    async fn logout(&mut self) {
        VcloudClient::logout(self).await
    }
}
