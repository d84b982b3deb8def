// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error type tests for broccoli-client.

use broccoli_client::ClientError;

#[test]
fn test_config_error_display() {
    let err = ClientError::Config("missing address".to_string());
    assert!(err.to_string().contains("configuration error"));
    assert!(err.to_string().contains("missing address"));
}

#[test]
fn test_unreachable_error_display() {
    let err = ClientError::Unreachable("connection refused".to_string());
    assert!(err.to_string().contains("backend unreachable"));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_http_error_display_is_banner_message() {
    let err = ClientError::Http {
        status: 500,
        status_text: "Internal Server Error".to_string(),
        data: "template not found".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Internal Server Error (500): template not found"
    );
}

#[test]
fn test_serialization_error_display() {
    let err = ClientError::Serialization("unexpected token".to_string());
    assert!(err.to_string().contains("serialization error"));
}

#[test]
fn test_unreachable_status_is_minus_one() {
    let err = ClientError::Unreachable("timed out".to_string());
    assert_eq!(err.status(), Some(-1));
    assert!(err.is_unreachable());
    assert!(!err.is_auth_failure());
}

#[test]
fn test_forbidden_is_auth_failure() {
    let err = ClientError::Http {
        status: 403,
        status_text: "Forbidden".to_string(),
        data: String::new(),
    };
    assert!(err.is_auth_failure());
    assert_eq!(err.status(), Some(403));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientError>();
}

#[test]
fn test_from_serde_json_error() {
    let json_err = serde_json::from_str::<u32>("\"ten\"").unwrap_err();
    let err: ClientError = json_err.into();
    assert!(matches!(err, ClientError::Serialization(_)));
}
