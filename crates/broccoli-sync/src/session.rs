// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Session state shared between pollers, mutations and views.
//!
//! The legacy client kept `isLoggedIn` and `broccoliReachable` as ambient
//! globals. Here they are an explicitly owned object: cheap to clone, passed
//! to whoever needs them, with watch channels for change notification.

use std::sync::Arc;

use broccoli_client::ClientError;
use tokio::sync::watch;

/// Login and reachability flags for one backend connection.
///
/// `logged_in` starts out `true`: the client assumes it is authenticated (or
/// that the backend runs without authentication) until a 403 proves
/// otherwise. `reachable` flips to `false` on transport failures and back to
/// `true` on the first successful request.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    logged_in: watch::Sender<bool>,
    reachable: watch::Sender<bool>,
}

impl Session {
    pub fn new() -> Self {
        let (logged_in, _) = watch::channel(true);
        let (reachable, _) = watch::channel(true);
        Self {
            inner: Arc::new(SessionInner {
                logged_in,
                reachable,
            }),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        *self.inner.logged_in.borrow()
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        Self::set(&self.inner.logged_in, logged_in);
    }

    /// Subscribe to login-state changes. Instance polling parks on this
    /// channel while logged out.
    pub fn subscribe_logged_in(&self) -> watch::Receiver<bool> {
        self.inner.logged_in.subscribe()
    }

    pub fn is_reachable(&self) -> bool {
        *self.inner.reachable.borrow()
    }

    pub fn set_reachable(&self, reachable: bool) {
        Self::set(&self.inner.reachable, reachable);
    }

    /// Subscribe to reachability changes, e.g. to drive an "unreachable"
    /// banner.
    pub fn subscribe_reachable(&self) -> watch::Receiver<bool> {
        self.inner.reachable.subscribe()
    }

    /// Apply the failure taxonomy to the session flags: a transport failure
    /// marks the backend unreachable, a 403 clears the login flag. All other
    /// errors leave the session untouched.
    pub fn note_failure(&self, error: &ClientError) {
        if error.is_unreachable() {
            self.set_reachable(false);
        } else if error.is_auth_failure() {
            self.set_logged_in(false);
        }
    }

    /// A request succeeded: the backend is reachable again.
    pub fn note_success(&self) {
        self.set_reachable(true);
    }

    fn set(sender: &watch::Sender<bool>, value: bool) {
        // Only notify subscribers on actual transitions.
        sender.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_logged_in_and_reachable() {
        let session = Session::new();
        assert!(session.is_logged_in());
        assert!(session.is_reachable());
    }

    #[test]
    fn test_unreachable_failure_clears_reachable_only() {
        let session = Session::new();
        session.note_failure(&ClientError::Unreachable("refused".to_string()));
        assert!(!session.is_reachable());
        assert!(session.is_logged_in());
    }

    #[test]
    fn test_forbidden_failure_clears_login_only() {
        let session = Session::new();
        session.note_failure(&ClientError::Http {
            status: 403,
            status_text: "Forbidden".to_string(),
            data: String::new(),
        });
        assert!(!session.is_logged_in());
        assert!(session.is_reachable());
    }

    #[test]
    fn test_generic_failure_leaves_session_untouched() {
        let session = Session::new();
        session.note_failure(&ClientError::Http {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            data: String::new(),
        });
        assert!(session.is_logged_in());
        assert!(session.is_reachable());
    }

    #[test]
    fn test_success_restores_reachable() {
        let session = Session::new();
        session.set_reachable(false);
        session.note_success();
        assert!(session.is_reachable());
    }

    #[test]
    fn test_subscribers_see_transitions_only() {
        let session = Session::new();
        let logged_in = session.subscribe_logged_in();

        session.set_logged_in(true); // no transition
        assert!(!logged_in.has_changed().unwrap());

        session.set_logged_in(false);
        assert!(logged_in.has_changed().unwrap());
    }
}
