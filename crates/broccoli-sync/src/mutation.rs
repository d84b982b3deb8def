// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! User-triggered mutations against the backend.
//!
//! The mutation service is a stateless pass-through: it owns no data, issues
//! one request per operation and reports the outcome to the session flags
//! and the global banner. Every instance operation requests an accelerated
//! refresh afterwards, success or not, so server-side effects (including
//! those of concurrent operators) show up without waiting for the next full
//! poll interval. There are no automatic retries; the operator re-attempts.

use std::collections::HashMap;
use std::sync::Arc;

use broccoli_client::{
    BroccoliClient, Credentials, EditInstancePayload, Instance, InstanceStatus, Result,
};
use tracing::{debug, warn};

use crate::banner::Banner;
use crate::mirror::Mirror;
use crate::poller::Refresher;
use crate::session::Session;

/// Issues create/edit/status/delete operations and funnels their outcomes
/// into the shared session and banner.
pub struct MutationService {
    client: Arc<BroccoliClient>,
    mirror: Mirror,
    session: Session,
    banner: Banner,
    refresher: Refresher,
}

impl MutationService {
    pub fn new(
        client: Arc<BroccoliClient>,
        mirror: Mirror,
        session: Session,
        banner: Banner,
        refresher: Refresher,
    ) -> Self {
        Self {
            client,
            mirror,
            session,
            banner,
            refresher,
        }
    }

    /// Create an instance of a template.
    ///
    /// The created instance is not inserted into the mirror directly; the
    /// accelerated refresh picks it up together with anything else that
    /// changed server-side.
    pub async fn create_instance(
        &self,
        template_id: &str,
        parameter_values: HashMap<String, String>,
    ) -> Result<Instance> {
        let result = self.client.create_instance(template_id, &parameter_values).await;
        self.refresher.refresh_instances_soon();
        self.settle(result)
    }

    /// Edit an instance's parameter values, optionally migrating it to
    /// `selected_template`. The caller (the parameter form) has already
    /// restricted `parameter_values` to the target template's parameters.
    pub async fn edit_instance(
        &self,
        instance_id: &str,
        parameter_values: HashMap<String, String>,
        selected_template: Option<String>,
    ) -> Result<Instance> {
        let mut payload = EditInstancePayload::new(parameter_values);
        if let Some(template_id) = selected_template {
            payload = payload.with_selected_template(template_id);
        }
        let result = self.client.edit_instance(instance_id, &payload).await;
        self.refresher.refresh_instances_soon();
        self.settle(result)
    }

    /// Start or stop an instance. On success the returned snapshot is merged
    /// field by field into the mirrored instance, so views holding it see
    /// the new status without losing the fields the backend did not send.
    pub async fn set_instance_status(
        &self,
        template_id: &str,
        instance_id: &str,
        status: InstanceStatus,
    ) -> Result<serde_json::Value> {
        let result = self.client.set_instance_status(instance_id, status).await;
        self.refresher.refresh_instances_soon();
        match result {
            Ok(snapshot) => {
                self.session.note_success();
                self.banner.clear();
                self.mirror
                    .merge_instance(template_id, instance_id, &snapshot)
                    .await;
                Ok(snapshot)
            }
            Err(e) => {
                warn!(instance_id = %instance_id, error = %e, "Status change failed");
                self.session.note_failure(&e);
                self.banner.report(&e);
                Err(e)
            }
        }
    }

    /// Delete an instance.
    ///
    /// The instance is removed from the mirror before the request is issued
    /// and not restored on failure; the next (accelerated) poll re-adds it
    /// if the backend still has it.
    pub async fn delete_instance(&self, template_id: &str, instance_id: &str) -> Result<()> {
        self.banner.clear();
        self.mirror.remove_instance(template_id, instance_id).await;

        let result = self.client.delete_instance(instance_id).await;
        self.refresher.refresh_instances_soon();
        self.settle(result)
    }

    /// Establish a backend session and mark the session logged in.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        match self.client.login(credentials).await {
            Ok(()) => {
                debug!(username = %credentials.username, "Login succeeded");
                self.session.note_success();
                self.session.set_logged_in(true);
                self.banner.clear();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.session.note_failure(&e);
                self.banner.report_login_failed();
                Err(e)
            }
        }
    }

    /// Clear the backend session and mark the session logged out, halting
    /// authenticated polling.
    pub async fn logout(&self) -> Result<()> {
        match self.client.logout().await {
            Ok(()) => {
                self.session.set_logged_in(false);
                self.banner.clear();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout failed");
                self.session.note_failure(&e);
                self.banner.report_logout_failed();
                Err(e)
            }
        }
    }

    /// Common success/failure bookkeeping for operations without a merge
    /// step.
    fn settle<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.session.note_success();
                self.banner.clear();
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "Mutation failed");
                self.session.note_failure(&e);
                self.banner.report(&e);
                Err(e)
            }
        }
    }
}
