// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Polling synchronizer keeping the mirror fresh.
//!
//! One background loop per tracked collection (templates, instances, about).
//! Each loop fetches, applies the result to the mirror, then waits for the
//! next tick; the next fetch is armed only after the previous one settles,
//! so there is never more than one in-flight request per collection. Loops
//! for different collections are independent and unordered relative to each
//! other.
//!
//! Fetch failures are absorbed here: the mirror keeps its stale content and
//! the next tick retries. The only failure effects are the session flags
//! (unreachable on transport failure, logged-out on 403).

use std::sync::Arc;
use std::time::Duration;

use broccoli_client::BroccoliClient;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::mirror::Mirror;
use crate::session::Session;

/// Lower bound on the poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Timing configuration for the synchronizer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between poll ticks of one collection. Clamped to
    /// [`MIN_POLL_INTERVAL`]; configurable upward only.
    pub poll_interval: Duration,
    /// Delay of an accelerated refresh requested after a mutation.
    pub refresh_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: MIN_POLL_INTERVAL,
            refresh_delay: Duration::from_millis(500),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval. Values below [`MIN_POLL_INTERVAL`] are clamped.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Set the accelerated refresh delay.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }
}

/// Requests accelerated refreshes from the running pollers.
///
/// A refresh fires "soon" (after [`SyncConfig::refresh_delay`]) instead of
/// waiting for the rest of the poll interval. Mutations hold one of these so
/// their server-side effects show up quickly.
#[derive(Clone)]
pub struct Refresher {
    templates: Arc<Notify>,
    instances: Arc<Notify>,
    about: Arc<Notify>,
}

impl Refresher {
    pub fn refresh_templates_soon(&self) {
        self.templates.notify_one();
    }

    pub fn refresh_instances_soon(&self) {
        self.instances.notify_one();
    }

    pub fn refresh_about_soon(&self) {
        self.about.notify_one();
    }
}

/// Handle to the spawned poller tasks.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    refresher: Refresher,
}

impl SyncHandle {
    /// A cloneable handle for requesting accelerated refreshes.
    pub fn refresher(&self) -> Refresher {
        self.refresher.clone()
    }

    pub fn refresh_templates_soon(&self) {
        self.refresher.refresh_templates_soon();
    }

    pub fn refresh_instances_soon(&self) {
        self.refresher.refresh_instances_soon();
    }

    pub fn refresh_about_soon(&self) {
        self.refresher.refresh_about_soon();
    }

    /// Stop all pollers and wait for them to finish. In-flight fetches are
    /// not cancelled; their results land in a mirror nobody reads anymore.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// The polling synchronizer. Owns mirror writes; consumed by [`spawn`].
///
/// [`spawn`]: Synchronizer::spawn
pub struct Synchronizer {
    client: Arc<BroccoliClient>,
    mirror: Mirror,
    session: Session,
    config: SyncConfig,
    refresh_templates: Arc<Notify>,
    refresh_instances: Arc<Notify>,
    refresh_about: Arc<Notify>,
}

impl Synchronizer {
    pub fn new(
        client: Arc<BroccoliClient>,
        mirror: Mirror,
        session: Session,
        config: SyncConfig,
    ) -> Self {
        let mut config = config;
        config.poll_interval = config.poll_interval.max(MIN_POLL_INTERVAL);
        Self {
            client,
            mirror,
            session,
            config,
            refresh_templates: Arc::new(Notify::new()),
            refresh_instances: Arc::new(Notify::new()),
            refresh_about: Arc::new(Notify::new()),
        }
    }

    /// Spawn the template, instance and about pollers.
    ///
    /// Each loop polls once immediately, so callers get initial data without
    /// waiting a full interval.
    pub fn spawn(self) -> SyncHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let refresher = Refresher {
            templates: self.refresh_templates.clone(),
            instances: self.refresh_instances.clone(),
            about: self.refresh_about.clone(),
        };

        let this = Arc::new(self);
        let tasks = vec![
            tokio::spawn(Arc::clone(&this).run_templates(shutdown_rx.clone())),
            tokio::spawn(Arc::clone(&this).run_instances(shutdown_rx.clone())),
            tokio::spawn(this.run_about(shutdown_rx)),
        ];

        SyncHandle {
            shutdown: shutdown_tx,
            tasks,
            refresher,
        }
    }

    // =========================================================================
    // Poll loops
    // =========================================================================

    async fn run_templates(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Template poller started"
        );
        loop {
            self.poll_templates_once().await;
            if self
                .wait_for_next_tick(&mut shutdown, &self.refresh_templates)
                .await
            {
                break;
            }
        }
        info!("Template poller stopped");
    }

    async fn run_instances(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Instance poller started"
        );
        let mut logged_in = self.session.subscribe_logged_in();
        loop {
            if !*logged_in.borrow() {
                // Park until login; unauthenticated ticks would only hammer
                // the backend with requests bound to fail.
                tokio::select! {
                    biased;

                    _ = shutdown.wait_for(|stop| *stop) => break,
                    result = logged_in.wait_for(|logged_in| *logged_in) => {
                        if result.is_err() {
                            break;
                        }
                    }
                }
            }
            self.poll_instances_once().await;
            if self
                .wait_for_next_tick(&mut shutdown, &self.refresh_instances)
                .await
            {
                break;
            }
        }
        info!("Instance poller stopped");
    }

    async fn run_about(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "About poller started"
        );
        loop {
            self.poll_about_once().await;
            if self
                .wait_for_next_tick(&mut shutdown, &self.refresh_about)
                .await
            {
                break;
            }
        }
        info!("About poller stopped");
    }

    /// Wait for the next tick: the poll interval, or an accelerated refresh
    /// after `refresh_delay`. Returns true when shutdown was requested.
    async fn wait_for_next_tick(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        refresh: &Notify,
    ) -> bool {
        let accelerated = tokio::select! {
            biased;

            _ = shutdown.wait_for(|stop| *stop) => return true,
            _ = refresh.notified() => true,
            _ = tokio::time::sleep(self.config.poll_interval) => false,
        };
        if accelerated {
            tokio::select! {
                biased;

                _ = shutdown.wait_for(|stop| *stop) => return true,
                _ = tokio::time::sleep(self.config.refresh_delay) => {}
            }
        }
        false
    }

    // =========================================================================
    // Single fetches
    // =========================================================================

    async fn poll_templates_once(&self) {
        match self.client.list_templates().await {
            Ok(templates) => {
                self.session.note_success();
                self.mirror.apply_templates(templates).await;
            }
            Err(e) => {
                debug!(error = %e, "Template poll failed");
                self.session.note_failure(&e);
            }
        }
    }

    async fn poll_instances_once(&self) {
        for template_id in self.mirror.template_ids().await {
            match self.client.list_instances(Some(&template_id)).await {
                Ok(instances) => {
                    self.session.note_success();
                    self.mirror.apply_instances(&template_id, instances).await;
                }
                Err(e) => {
                    debug!(template_id = %template_id, error = %e, "Instance poll failed");
                    self.session.note_failure(&e);
                    if e.is_auth_failure() {
                        // The remaining templates would fail the same way.
                        break;
                    }
                }
            }
        }
    }

    async fn poll_about_once(&self) {
        match self.client.about().await {
            Ok(about) => {
                self.session.note_success();
                self.mirror.set_about(about).await;
            }
            Err(e) => {
                debug!(error = %e, "About poll failed");
                self.session.note_failure(&e);
            }
        }
    }
}
