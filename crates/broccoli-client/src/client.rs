// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! REST gateway for a Cluster Broccoli backend.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{
    AboutInfo, CreateInstancePayload, Credentials, EditInstancePayload, Instance, InstanceStatus,
    Template,
};

/// Versioned API prefix appended to the configured base URL.
const API_PREFIX: &str = "/api/v1";

/// Thin client over the Broccoli REST API.
///
/// One async method per resource, each resolving to the decoded payload or a
/// status-tagged [`ClientError`]. The client holds no state beyond the HTTP
/// connection pool and the cookie jar carrying the backend session; retry
/// policy belongs to the caller (the synchronizer retries on its next tick,
/// mutations surface the failure to the operator).
pub struct BroccoliClient {
    http: reqwest::Client,
    base: String,
}

impl BroccoliClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/').to_string();
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "base URL must start with http:// or https://, got {}",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client for localhost development.
    pub fn localhost() -> Result<Self> {
        Self::new(ClientConfig::localhost())
    }

    /// Base URL this client talks to, without the API prefix.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base, API_PREFIX, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let data = response.text().await.unwrap_or_default();
            Err(ClientError::http(status, data))
        }
    }

    async fn expect_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let data = response.text().await.unwrap_or_default();
            Err(ClientError::http(status, data))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// List all templates known to the backend.
    #[instrument(skip(self))]
    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        debug!("Listing templates");
        self.get_json("/templates").await
    }

    /// Fetch a single template by id.
    #[instrument(skip(self))]
    pub async fn get_template(&self, id: &str) -> Result<Template> {
        debug!(template_id = %id, "Fetching template");
        self.get_json(&format!("/templates/{}", id)).await
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// List instances, optionally restricted to one template.
    #[instrument(skip(self))]
    pub async fn list_instances(&self, template_id: Option<&str>) -> Result<Vec<Instance>> {
        debug!(template_id = ?template_id, "Listing instances");
        let mut request = self.http.get(self.url("/instances"));
        if let Some(id) = template_id {
            request = request.query(&[("templateId", id)]);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Create an instance of a template with the given parameter values.
    #[instrument(skip(self, parameters))]
    pub async fn create_instance(
        &self,
        template_id: &str,
        parameters: &std::collections::HashMap<String, String>,
    ) -> Result<Instance> {
        debug!(template_id = %template_id, "Creating instance");
        let payload = CreateInstancePayload::new(template_id, parameters.clone());
        self.post_json("/instances", &payload).await
    }

    /// Edit an instance's parameter values, optionally migrating it to a
    /// different template.
    #[instrument(skip(self, payload))]
    pub async fn edit_instance(
        &self,
        instance_id: &str,
        payload: &EditInstancePayload,
    ) -> Result<Instance> {
        debug!(
            instance_id = %instance_id,
            selected_template = ?payload.selected_template,
            "Editing instance"
        );
        self.post_json(&format!("/instances/{}", instance_id), payload)
            .await
    }

    /// Request a status change (start/stop) for an instance.
    ///
    /// Returns the backend's authoritative instance snapshot as raw JSON: the
    /// backend may answer with a partial object, and callers merge whatever
    /// fields are present into their own copy.
    #[instrument(skip(self))]
    pub async fn set_instance_status(
        &self,
        instance_id: &str,
        status: InstanceStatus,
    ) -> Result<serde_json::Value> {
        debug!(instance_id = %instance_id, status = %status, "Submitting status");
        self.post_json(
            &format!("/instances/{}", instance_id),
            &serde_json::json!({ "status": status }),
        )
        .await
    }

    /// Delete an instance.
    #[instrument(skip(self))]
    pub async fn delete_instance(&self, instance_id: &str) -> Result<()> {
        debug!(instance_id = %instance_id, "Deleting instance");
        let response = self
            .http
            .delete(self.url(&format!("/instances/{}", instance_id)))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    // =========================================================================
    // About & authentication
    // =========================================================================

    /// Fetch backend name, version and permission mode.
    #[instrument(skip(self))]
    pub async fn about(&self) -> Result<AboutInfo> {
        self.get_json("/about").await
    }

    /// Establish a backend session. The session cookie is kept in the
    /// client's cookie jar and sent on subsequent requests.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        debug!(username = %credentials.username, "Logging in");
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Clear the backend session.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        debug!("Logging out");
        let response = self.http.post(self.url("/auth/logout")).send().await?;
        Self::expect_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_scheme() {
        let result = BroccoliClient::new(ClientConfig::new("ftp://example.com"));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = BroccoliClient::new(ClientConfig::new("http://example.com/")).unwrap();
        assert_eq!(client.url("/templates"), "http://example.com/api/v1/templates");
    }
}
