// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the Broccoli client.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Configuration for [`BroccoliClient`](crate::BroccoliClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without the `/api/v1` prefix.
    pub base_url: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(), // Broccoli server default port
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given backend base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Create a configuration for localhost development.
    pub fn localhost() -> Self {
        Self::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BROCCOLI_ADDR`: Backend base URL (default: "http://127.0.0.1:9000")
    /// - `BROCCOLI_CONNECT_TIMEOUT_MS`: Connection timeout in milliseconds (default: 10000)
    /// - `BROCCOLI_REQUEST_TIMEOUT_MS`: Request timeout in milliseconds (default: 30000)
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("BROCCOLI_ADDR").unwrap_or_else(|_| "http://127.0.0.1:9000".to_string());

        let connect_timeout_ms: u64 = std::env::var("BROCCOLI_CONNECT_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid BROCCOLI_CONNECT_TIMEOUT_MS: {}", e)))?;

        let request_timeout_ms: u64 = std::env::var("BROCCOLI_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid BROCCOLI_REQUEST_TIMEOUT_MS: {}", e)))?;

        Ok(Self {
            base_url,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_new_strips_nothing() {
        let config = ClientConfig::new("https://broccoli.example.com");
        assert_eq!(config.base_url, "https://broccoli.example.com");
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::localhost()
            .with_base_url("http://10.0.0.1:9000")
            .with_connect_timeout(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "http://10.0.0.1:9000");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }
}
