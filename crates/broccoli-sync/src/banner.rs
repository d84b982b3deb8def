// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The single global error banner.
//!
//! Every user-triggered mutation reports here instead of building its own
//! error message; views subscribe to one channel and render one dismissible
//! message.

use std::sync::Arc;

use broccoli_client::ClientError;
use tokio::sync::watch;

/// Dismissible global error message.
#[derive(Clone)]
pub struct Banner {
    message: Arc<watch::Sender<Option<String>>>,
}

impl Banner {
    pub fn new() -> Self {
        let (message, _) = watch::channel(None);
        Self {
            message: Arc::new(message),
        }
    }

    /// Show the banner message for a failed request. `ClientError`'s display
    /// form is already the `"<statusText> (<status>): <data>"` shape the
    /// legacy banner used.
    pub fn report(&self, error: &ClientError) {
        self.set(Some(error.to_string()));
    }

    /// Fixed message overriding the generic form for failed logins.
    pub fn report_login_failed(&self) {
        self.set(Some("Login failed!".to_string()));
    }

    /// Fixed message overriding the generic form for failed logouts.
    pub fn report_logout_failed(&self) {
        self.set(Some("Logout failed!".to_string()));
    }

    /// Dismiss the banner.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Currently displayed message, if any.
    pub fn current(&self) -> Option<String> {
        self.message.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.message.subscribe()
    }

    fn set(&self, value: Option<String>) {
        self.message.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        });
    }
}

impl Default for Banner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        assert_eq!(Banner::new().current(), None);
    }

    #[test]
    fn test_report_formats_http_error() {
        let banner = Banner::new();
        banner.report(&ClientError::Http {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            data: "boom".to_string(),
        });
        assert_eq!(
            banner.current(),
            Some("Internal Server Error (500): boom".to_string())
        );
    }

    #[test]
    fn test_login_failure_overrides_generic_message() {
        let banner = Banner::new();
        banner.report(&ClientError::Unreachable("refused".to_string()));
        banner.report_login_failed();
        assert_eq!(banner.current(), Some("Login failed!".to_string()));
    }

    #[test]
    fn test_clear_dismisses() {
        let banner = Banner::new();
        banner.report_logout_failed();
        banner.clear();
        assert_eq!(banner.current(), None);
    }
}
