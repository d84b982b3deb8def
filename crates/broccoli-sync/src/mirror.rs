// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The local mirror of backend state.
//!
//! The mirror is a reflection of the last successful poll response, never an
//! authority of its own: fetch failures leave it untouched, successful
//! fetches replace whole collections keyed by id. Views hold clones of
//! [`Mirror`] for reading and subscribe to a generation counter that bumps
//! only when content observably changes, so an identical re-fetch produces
//! no spurious render.

use std::collections::HashMap;
use std::sync::Arc;

use broccoli_client::{AboutInfo, Instance, Template};
use tokio::sync::{RwLock, watch};
use tracing::warn;

/// One template together with its mirrored instances.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    pub template: Template,
    pub instances: HashMap<String, Instance>,
}

#[derive(Debug, Default, PartialEq)]
struct MirrorState {
    templates: HashMap<String, TemplateEntry>,
    about: Option<AboutInfo>,
}

/// Shared handle to the mirrored backend state.
#[derive(Clone)]
pub struct Mirror {
    inner: Arc<MirrorInner>,
}

struct MirrorInner {
    state: RwLock<MirrorState>,
    generation: watch::Sender<u64>,
}

impl Mirror {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            inner: Arc::new(MirrorInner {
                state: RwLock::new(MirrorState::default()),
                generation,
            }),
        }
    }

    /// Subscribe to content changes. The carried value is a generation
    /// counter; it increments once per observable change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.generation.subscribe()
    }

    /// Current change generation.
    pub fn generation(&self) -> u64 {
        *self.inner.generation.borrow()
    }

    fn bump(&self) {
        self.inner.generation.send_modify(|generation| *generation += 1);
    }

    // =========================================================================
    // Writes (synchronizer and mutation service only)
    // =========================================================================

    /// Replace the template collection with the latest fetch result.
    ///
    /// Templates are replaced wholesale, keyed by id: ids absent from the
    /// response disappear, new ids appear. The locally attached instance
    /// maps survive for templates that persist across the fetch.
    pub async fn apply_templates(&self, templates: Vec<Template>) -> bool {
        let mut state = self.inner.state.write().await;
        let mut next = HashMap::with_capacity(templates.len());
        for template in templates {
            let instances = state
                .templates
                .get(&template.id)
                .map(|entry| entry.instances.clone())
                .unwrap_or_default();
            next.insert(template.id.clone(), TemplateEntry { template, instances });
        }
        if state.templates == next {
            return false;
        }
        state.templates = next;
        drop(state);
        self.bump();
        true
    }

    /// Replace one template's instance map with the latest fetch result.
    ///
    /// Unknown template ids are ignored: the response belongs to a template
    /// that has since vanished from the mirror.
    pub async fn apply_instances(&self, template_id: &str, instances: Vec<Instance>) -> bool {
        let mut state = self.inner.state.write().await;
        let Some(entry) = state.templates.get_mut(template_id) else {
            return false;
        };
        let next: HashMap<String, Instance> = instances
            .into_iter()
            .map(|instance| (instance.id.clone(), instance))
            .collect();
        if entry.instances == next {
            return false;
        }
        entry.instances = next;
        drop(state);
        self.bump();
        true
    }

    /// Store the latest about record.
    pub async fn set_about(&self, about: AboutInfo) -> bool {
        let mut state = self.inner.state.write().await;
        if state.about.as_ref() == Some(&about) {
            return false;
        }
        state.about = Some(about);
        drop(state);
        self.bump();
        true
    }

    /// Merge a server-side instance snapshot field by field into the
    /// mirrored instance, keeping fields the snapshot does not mention.
    ///
    /// The snapshot is raw JSON because the backend may answer a status
    /// change with a partial object. A snapshot that does not merge into a
    /// valid instance is ignored.
    pub async fn merge_instance(
        &self,
        template_id: &str,
        instance_id: &str,
        snapshot: &serde_json::Value,
    ) -> bool {
        let mut state = self.inner.state.write().await;
        let Some(instance) = state
            .templates
            .get_mut(template_id)
            .and_then(|entry| entry.instances.get_mut(instance_id))
        else {
            return false;
        };

        let mut merged = match serde_json::to_value(&*instance) {
            Ok(value) => value,
            Err(e) => {
                warn!(instance_id = %instance_id, error = %e, "Failed to serialize mirrored instance");
                return false;
            }
        };
        let (Some(base), Some(fields)) = (merged.as_object_mut(), snapshot.as_object()) else {
            return false;
        };
        for (key, value) in fields {
            base.insert(key.clone(), value.clone());
        }

        match serde_json::from_value::<Instance>(merged) {
            Ok(updated) => {
                if *instance == updated {
                    return false;
                }
                *instance = updated;
                drop(state);
                self.bump();
                true
            }
            Err(e) => {
                warn!(instance_id = %instance_id, error = %e, "Ignoring unmergeable instance snapshot");
                false
            }
        }
    }

    /// Remove an instance, e.g. as the optimistic half of a delete.
    pub async fn remove_instance(&self, template_id: &str, instance_id: &str) -> bool {
        let mut state = self.inner.state.write().await;
        let removed = state
            .templates
            .get_mut(template_id)
            .and_then(|entry| entry.instances.remove(instance_id))
            .is_some();
        drop(state);
        if removed {
            self.bump();
        }
        removed
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All mirrored template ids, sorted.
    pub async fn template_ids(&self) -> Vec<String> {
        let state = self.inner.state.read().await;
        let mut ids: Vec<String> = state.templates.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All mirrored templates, sorted by id.
    pub async fn templates(&self) -> Vec<Template> {
        let state = self.inner.state.read().await;
        let mut templates: Vec<Template> = state
            .templates
            .values()
            .map(|entry| entry.template.clone())
            .collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    /// All mirrored templates with their instances, sorted by template id.
    pub async fn entries(&self) -> Vec<TemplateEntry> {
        let state = self.inner.state.read().await;
        let mut entries: Vec<TemplateEntry> = state.templates.values().cloned().collect();
        entries.sort_by(|a, b| a.template.id.cmp(&b.template.id));
        entries
    }

    /// Instances of one template, sorted by id. Empty for unknown templates.
    pub async fn instances(&self, template_id: &str) -> Vec<Instance> {
        let state = self.inner.state.read().await;
        let mut instances: Vec<Instance> = state
            .templates
            .get(template_id)
            .map(|entry| entry.instances.values().cloned().collect())
            .unwrap_or_default();
        instances.sort_by(|a, b| a.id.cmp(&b.id));
        instances
    }

    /// Look up one instance under a known template.
    pub async fn get_instance(&self, template_id: &str, instance_id: &str) -> Option<Instance> {
        let state = self.inner.state.read().await;
        state
            .templates
            .get(template_id)
            .and_then(|entry| entry.instances.get(instance_id))
            .cloned()
    }

    /// Find an instance by id alone, returning its owning template id.
    pub async fn find_instance(&self, instance_id: &str) -> Option<(String, Instance)> {
        let state = self.inner.state.read().await;
        state.templates.iter().find_map(|(template_id, entry)| {
            entry
                .instances
                .get(instance_id)
                .map(|instance| (template_id.clone(), instance.clone()))
        })
    }

    /// Latest about record, if any poll has succeeded yet.
    pub async fn about(&self) -> Option<AboutInfo> {
        self.inner.state.read().await.about.clone()
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}
