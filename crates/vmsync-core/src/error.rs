//! Error types shared by the inventory clients.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryErrorKind {
    /// Endpoint unreachable or access check refused.
    ConnectionError,
    /// Credentials rejected or session token missing.
    AuthenticationError,
    NotFound,
    /// Any other non-success status.
    ApiError(u16),
    /// A create call succeeded but the response carried no identifier.
    MissingId,
    Timeout,
    ParseError,
    Other,
}

/// Failure of a single inventory call. The engine decides from the call
/// site, not the kind, whether it ends the run.
#[derive(Debug, Clone)]
pub struct InventoryError {
    pub kind: InventoryErrorKind,
    pub message: String,
}

impl InventoryError {
    fn new(kind: InventoryErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::ConnectionError, msg)
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::AuthenticationError, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::NotFound, msg)
    }

    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::ApiError(status), msg)
    }

    pub fn missing_id(msg: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::MissingId, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::ParseError, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::Timeout, msg)
    }
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for InventoryError {}

impl From<reqwest::Error> for InventoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("HTTP timeout: {e}"))
        } else if e.is_connect() {
            Self::connection(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::parse(format!("Failed to decode response: {e}"))
        } else {
            Self::new(InventoryErrorKind::Other, format!("HTTP error: {e}"))
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {e}"))
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;
