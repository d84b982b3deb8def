// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parameter-entry form for creating and editing instances.
//!
//! A pure state machine with no network access: built from a template
//! (optionally pre-filled from an existing instance), re-targetable to a
//! different template mid-edit, and collapsed into a submission map on
//! confirm. Views render [`fields`](InstanceForm::fields) in order and feed
//! operator input back through [`set_value`](InstanceForm::set_value).

use std::collections::HashMap;

use broccoli_client::{Instance, Template};

/// One entry of the parameter form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: String,
    /// The template marked this parameter secret; render masked.
    pub secret: bool,
    /// Operator toggled the mask off for this field.
    pub revealed: bool,
}

impl FormField {
    /// The value as it should be rendered. Masking is purely a presentation
    /// concern; [`value`](FormField::value) always holds the real input.
    pub fn display_value(&self) -> String {
        if self.secret && !self.revealed {
            "\u{2022}".repeat(8)
        } else {
            self.value.clone()
        }
    }
}

/// Result of confirming the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    /// Entered values, with empty entries dropped (the backend treats
    /// absent parameters as "use default").
    pub parameter_values: HashMap<String, String>,
    /// Target template id when the edit migrates the instance, `None` when
    /// the template is unchanged.
    pub selected_template: Option<String>,
}

/// Parameter form state for one create or edit dialog.
#[derive(Debug, Clone)]
pub struct InstanceForm {
    template_id: String,
    template_version: String,
    /// The instance's template at the time the edit dialog opened. `None`
    /// for create forms.
    original_template_id: Option<String>,
    instance_id: Option<String>,
    fields: Vec<FormField>,
}

impl InstanceForm {
    /// Form for creating a new instance: one field per declared parameter,
    /// pre-filled with the declared default.
    pub fn for_create(template: &Template) -> Self {
        Self {
            template_id: template.id.clone(),
            template_version: template.version.clone(),
            original_template_id: None,
            instance_id: None,
            fields: build_fields(template, &HashMap::new()),
        }
    }

    /// Form for editing an existing instance: pre-filled from the
    /// instance's current parameter values.
    pub fn for_edit(template: &Template, instance: &Instance) -> Self {
        Self {
            template_id: template.id.clone(),
            template_version: template.version.clone(),
            original_template_id: Some(template.id.clone()),
            instance_id: Some(instance.id.clone()),
            fields: build_fields(template, &instance.parameter_values),
        }
    }

    /// Re-target the form to a different template.
    ///
    /// The field set is rebuilt in the new template's declared order.
    /// Entered values survive for parameter names both templates share;
    /// values for parameters the new template does not declare are
    /// discarded, and newly appearing parameters start from their declared
    /// defaults.
    pub fn retarget(&mut self, template: &Template) {
        let entered: HashMap<String, String> = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect();
        self.fields = build_fields(template, &entered);
        self.template_id = template.id.clone();
        self.template_version = template.version.clone();
    }

    /// Set a field's value. Returns false for unknown parameter names.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Current value of a field.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Toggle the secret mask of a field. Returns false for unknown names.
    pub fn toggle_reveal(&mut self, name: &str) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.revealed = !field.revealed;
                true
            }
            None => false,
        }
    }

    /// Fields in the targeted template's declared parameter order.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// The template this form currently targets.
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// The instance being edited, if any.
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    pub fn is_edit(&self) -> bool {
        self.instance_id.is_some()
    }

    /// Target template id to send with the edit, `None` while unchanged.
    pub fn selected_template(&self) -> Option<&str> {
        match &self.original_template_id {
            Some(original) if *original != self.template_id => Some(&self.template_id),
            _ => None,
        }
    }

    /// Dialog title, e.g. `New http-server (f88dbbdc)` or
    /// `Edit my-http (http-server, f88dbbdc)`.
    pub fn panel_title(&self) -> String {
        let short_version = &self.template_version[..self.template_version.len().min(8)];
        match &self.instance_id {
            None => format!("New {} ({})", self.template_id, short_version),
            Some(instance_id) => {
                format!("Edit {} ({}, {})", instance_id, self.template_id, short_version)
            }
        }
    }

    /// Confirm-button label.
    pub fn ok_label(&self) -> &'static str {
        if self.is_edit() {
            "Edit instance"
        } else {
            "Create instance"
        }
    }

    /// Confirm the form: collapse the fields into the value map, dropping
    /// entries whose entered value is empty.
    pub fn submit(self) -> FormSubmission {
        let selected_template = self.selected_template().map(str::to_string);
        let parameter_values = self
            .fields
            .into_iter()
            .filter(|field| !field.value.is_empty())
            .map(|field| (field.name, field.value))
            .collect();
        FormSubmission {
            parameter_values,
            selected_template,
        }
    }
}

/// One field per declared parameter, in declared order: the existing value
/// when present, the declared default otherwise.
fn build_fields(template: &Template, existing: &HashMap<String, String>) -> Vec<FormField> {
    template
        .parameters
        .iter()
        .map(|name| {
            let value = existing
                .get(name)
                .cloned()
                .or_else(|| template.default_for(name).map(str::to_string))
                .unwrap_or_default();
            FormField {
                name: name.clone(),
                value,
                secret: template.is_secret(name),
                revealed: false,
            }
        })
        .collect()
}
