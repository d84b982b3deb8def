// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for broccoli-client.

use thiserror::Error;

/// Result type using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a Cluster Broccoli backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The backend could not be reached at all (no HTTP status available).
    ///
    /// The legacy browser client tagged this condition with status `-1`,
    /// distinct from an authentication failure (403).
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with a non-2xx status.
    ///
    /// Rendered as `"<statusText> (<status>): <data>"`, the exact shape the
    /// global error banner displays.
    #[error("{status_text} ({status}): {data}")]
    Http {
        status: u16,
        status_text: String,
        data: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// HTTP status carried by this error, with `-1` standing in for an
    /// unreachable backend. `None` for local errors that never hit the wire.
    pub fn status(&self) -> Option<i32> {
        match self {
            ClientError::Http { status, .. } => Some(i32::from(*status)),
            ClientError::Unreachable(_) => Some(-1),
            _ => None,
        }
    }

    /// True when the backend could not be reached (transport failure).
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Unreachable(_))
    }

    /// True when the backend rejected the session (HTTP 403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Http { status: 403, .. })
    }

    pub(crate) fn http(status: reqwest::StatusCode, data: String) -> Self {
        ClientError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            data,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Serialization(err.to_string())
        } else {
            ClientError::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_matches_banner_format() {
        let err = ClientError::Http {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            data: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Internal Server Error (500): boom");
    }

    #[test]
    fn test_status_tags() {
        let http = ClientError::Http {
            status: 404,
            status_text: "Not Found".to_string(),
            data: String::new(),
        };
        assert_eq!(http.status(), Some(404));

        let unreachable = ClientError::Unreachable("connection refused".to_string());
        assert_eq!(unreachable.status(), Some(-1));

        let config = ClientError::Config("bad address".to_string());
        assert_eq!(config.status(), None);
    }

    #[test]
    fn test_auth_failure_is_not_unreachable() {
        let err = ClientError::Http {
            status: 403,
            status_text: "Forbidden".to_string(),
            data: String::new(),
        };
        assert!(err.is_auth_failure());
        assert!(!err.is_unreachable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<()>("not json").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::Serialization(_)));
    }
}
