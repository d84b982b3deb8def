// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire types for the Broccoli REST API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Instance lifecycle status. Owned by the backend, never computed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Instance is queued, not yet started.
    Pending,
    /// Instance is currently running.
    Running,
    /// Instance is stopped.
    Stopped,
    /// Instance failed to run.
    Failed,
    /// Any status this client version does not know about.
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-parameter metadata declared by a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    /// Value used to pre-fill the parameter form; absent parameters are
    /// left to the backend's own defaulting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Marks the parameter for masked display in forms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<bool>,
}

impl ParameterInfo {
    /// True when the parameter should be masked in forms.
    pub fn is_secret(&self) -> bool {
        self.secret.unwrap_or(false)
    }
}

/// A parameterized application definition an operator can instantiate.
///
/// Immutable once fetched; each poll replaces the whole object rather than
/// merging fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub description: String,
    /// Parameter names in declared order. Forms render in this order.
    pub parameters: Vec<String>,
    #[serde(default)]
    pub parameter_infos: HashMap<String, ParameterInfo>,
    /// Content-addressed version of the template definition.
    pub version: String,
}

impl Template {
    /// Abbreviated version for display, e.g. `f88dbbdc`.
    pub fn short_version(&self) -> &str {
        &self.version[..self.version.len().min(8)]
    }

    /// Declared default value for a parameter, if any.
    pub fn default_for(&self, parameter: &str) -> Option<&str> {
        self.parameter_infos
            .get(parameter)
            .and_then(|info| info.default.as_deref())
    }

    /// Whether a parameter is declared secret.
    pub fn is_secret(&self, parameter: &str) -> bool {
        self.parameter_infos
            .get(parameter)
            .map(ParameterInfo::is_secret)
            .unwrap_or(false)
    }
}

/// Endpoint metadata for a service exposed by a running instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub protocol: String,
    pub address: String,
    pub port: u16,
}

/// A deployment created from a [`Template`] with concrete parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    /// Copy of the template this instance was created from.
    pub template: Template,
    pub parameter_values: HashMap<String, String>,
    pub status: InstanceStatus,
    #[serde(default)]
    pub services: HashMap<String, Service>,
}

/// Read-only backend information, polled on its own timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutInfo {
    pub name: String,
    pub version: String,
    pub permission_mode: String,
}

/// Login credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /instances` (instance creation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstancePayload {
    pub template_id: String,
    pub parameters: HashMap<String, String>,
}

impl CreateInstancePayload {
    pub fn new(template_id: impl Into<String>, parameters: HashMap<String, String>) -> Self {
        Self {
            template_id: template_id.into(),
            parameters,
        }
    }
}

/// Body of `POST /instances/{id}` when editing parameter values.
///
/// `selected_template` is present only when the edit also migrates the
/// instance to a different template; the field is omitted entirely when the
/// template is unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInstancePayload {
    pub parameter_values: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_template: Option<String>,
}

impl EditInstancePayload {
    pub fn new(parameter_values: HashMap<String, String>) -> Self {
        Self {
            parameter_values,
            selected_template: None,
        }
    }

    /// Signal a template migration alongside the edit.
    pub fn with_selected_template(mut self, template_id: impl Into<String>) -> Self {
        self.selected_template = Some(template_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_version_truncates_to_eight() {
        let template = Template {
            id: "http-server".to_string(),
            description: String::new(),
            parameters: vec![],
            parameter_infos: HashMap::new(),
            version: "f88dbbdc8249b8e5075598e165aec527".to_string(),
        };
        assert_eq!(template.short_version(), "f88dbbdc");
    }

    #[test]
    fn test_short_version_handles_short_strings() {
        let template = Template {
            id: "t".to_string(),
            description: String::new(),
            parameters: vec![],
            parameter_infos: HashMap::new(),
            version: "abc".to_string(),
        };
        assert_eq!(template.short_version(), "abc");
    }

    #[test]
    fn test_unknown_status_catch_all() {
        let status: InstanceStatus = serde_json::from_str("\"terminating\"").unwrap();
        assert_eq!(status, InstanceStatus::Unknown);
    }

    #[test]
    fn test_edit_payload_omits_unchanged_template() {
        let payload = EditInstancePayload::new(HashMap::from([(
            "cpu".to_string(),
            "250".to_string(),
        )]));
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("selectedTemplate").is_none());
        assert_eq!(json["parameterValues"]["cpu"], "250");
    }

    #[test]
    fn test_edit_payload_carries_selected_template() {
        let payload = EditInstancePayload::new(HashMap::new()).with_selected_template("jupyter");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["selectedTemplate"], "jupyter");
    }
}
