use std::time::Duration;

use thiserror::Error;

use crate::application::cart_store::DEFAULT_CART_KEY;
use crate::domain::order::ShippedCancel;

pub const DEFAULT_API_URL: &str = "http://localhost:4000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub database_url: String,
    pub api_url: String,
    pub cart_key: String,
    pub http_timeout: Duration,
    pub shipped_cancel: ShippedCancel,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let api_url = get("BOOKSTORE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let cart_key = get("CART_STORAGE_KEY").unwrap_or_else(|| DEFAULT_CART_KEY.to_string());

        let timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "HTTP_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let shipped_cancel = match get("SHIPPED_ORDER_CANCEL") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: "SHIPPED_ORDER_CANCEL",
                reason,
            })?,
            None => ShippedCancel::default(),
        };

        Ok(Self {
            database_url,
            api_url,
            cart_key,
            http_timeout: Duration::from_secs(timeout_secs),
            shipped_cancel,
        })
    }
}
