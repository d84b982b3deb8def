// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Broccoli Client SDK
//!
//! Typed client for the Cluster Broccoli REST API (`/api/v1`): list
//! templates, manage instance lifecycle (create, edit, start/stop, delete),
//! fetch backend information and hold an authenticated session.
//!
//! The client is deliberately thin. It performs exactly one HTTP call per
//! operation and maps every outcome to a status-tagged [`ClientError`];
//! polling, retry and caching policy live in `broccoli-sync`.
//!
//! # Example
//!
//! ```no_run
//! use broccoli_client::{BroccoliClient, ClientConfig, InstanceStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BroccoliClient::new(ClientConfig::new("http://broccoli.example.com:9000"))?;
//!
//! for template in client.list_templates().await? {
//!     println!("{} ({})", template.id, template.short_version());
//! }
//!
//! let instances = client.list_instances(Some("http-server")).await?;
//! if let Some(instance) = instances.first() {
//!     client.set_instance_status(&instance.id, InstanceStatus::Stopped).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::BroccoliClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use types::{
    AboutInfo, CreateInstancePayload, Credentials, EditInstancePayload, Instance, InstanceStatus,
    ParameterInfo, Service, Template,
};
