// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Broccoli Sync
//!
//! Client-side synchronization between a Cluster Broccoli backend and local
//! state: a polled [`Mirror`] of templates and instances, a
//! [`MutationService`] for create/edit/start/stop/delete operations, the
//! [`InstanceForm`] parameter-entry state machine, and the shared
//! [`Session`]/[`Banner`] objects views subscribe to.
//!
//! The design trades staleness for availability: poll failures never clear
//! the mirror, they only flip the session's reachability flag, and the next
//! tick retries. Mutations request an accelerated refresh so their effects
//! show up without waiting out the poll interval.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use broccoli_client::{BroccoliClient, ClientConfig};
//! use broccoli_sync::{Banner, Mirror, MutationService, Session, SyncConfig, Synchronizer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(BroccoliClient::new(ClientConfig::localhost())?);
//! let mirror = Mirror::new();
//! let session = Session::new();
//! let banner = Banner::new();
//!
//! let synchronizer = Synchronizer::new(
//!     client.clone(),
//!     mirror.clone(),
//!     session.clone(),
//!     SyncConfig::default(),
//! );
//! let handle = synchronizer.spawn();
//!
//! let mutations = MutationService::new(
//!     client,
//!     mirror.clone(),
//!     session,
//!     banner,
//!     handle.refresher(),
//! );
//!
//! let mut changes = mirror.subscribe();
//! changes.changed().await?;
//! for template in mirror.templates().await {
//!     println!("{}", template.id);
//! }
//! # drop(mutations);
//! # handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod banner;
mod form;
mod mirror;
mod mutation;
mod poller;
mod session;

pub use banner::Banner;
pub use form::{FormField, FormSubmission, InstanceForm};
pub use mirror::{Mirror, TemplateEntry};
pub use mutation::MutationService;
pub use poller::{MIN_POLL_INTERVAL, Refresher, SyncConfig, SyncHandle, Synchronizer};
pub use session::Session;
