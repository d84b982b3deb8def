// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parameter form behavior tests.

use broccoli_client::{Instance, Template};
use broccoli_sync::InstanceForm;

fn http_server() -> Template {
    serde_json::from_value(serde_json::json!({
        "id": "http-server",
        "description": "A simple Python HTTP request handler.",
        "parameters": ["id", "cpu"],
        "parameterInfos": {
            "cpu": { "name": "cpu", "default": "100" }
        },
        "version": "f88dbbdc8249b8e5075598e165aec527"
    }))
    .unwrap()
}

fn jupyter() -> Template {
    serde_json::from_value(serde_json::json!({
        "id": "jupyter",
        "description": "Interactive data science notebooks.",
        "parameters": ["id", "memory"],
        "parameterInfos": {
            "memory": { "name": "memory", "default": "1024" }
        },
        "version": "2c64126e09b72abd1a46f6db5b296221"
    }))
    .unwrap()
}

fn my_http() -> Instance {
    serde_json::from_value(serde_json::json!({
        "id": "my-http",
        "parameterValues": { "id": "my-http", "cpu": "250" },
        "status": "stopped",
        "services": {},
        "template": serde_json::to_value(http_server()).unwrap()
    }))
    .unwrap()
}

#[test]
fn test_create_form_prefills_declared_defaults() {
    let form = InstanceForm::for_create(&http_server());

    let names: Vec<&str> = form.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "cpu"]);
    assert_eq!(form.value("id"), Some(""));
    assert_eq!(form.value("cpu"), Some("100"));
    assert_eq!(form.panel_title(), "New http-server (f88dbbdc)");
    assert_eq!(form.ok_label(), "Create instance");
}

#[test]
fn test_edit_form_prefills_instance_values() {
    let form = InstanceForm::for_edit(&http_server(), &my_http());

    assert_eq!(form.value("id"), Some("my-http"));
    assert_eq!(form.value("cpu"), Some("250"));
    assert_eq!(form.panel_title(), "Edit my-http (http-server, f88dbbdc)");
    assert_eq!(form.ok_label(), "Edit instance");
}

#[test]
fn test_submit_drops_empty_values() {
    let mut form = InstanceForm::for_create(&http_server());
    form.set_value("cpu", "250");
    // "id" stays empty and must be absent from the submission.

    let submission = form.submit();
    assert_eq!(submission.parameter_values.len(), 1);
    assert_eq!(submission.parameter_values["cpu"], "250");
    assert!(!submission.parameter_values.contains_key("id"));
}

#[test]
fn test_retarget_discards_vanished_parameters_and_defaults_new_ones() {
    let mut form = InstanceForm::for_edit(&http_server(), &my_http());
    form.set_value("cpu", "500");

    form.retarget(&jupyter());

    let names: Vec<&str> = form.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "memory"]);
    // Shared parameter keeps the entered value.
    assert_eq!(form.value("id"), Some("my-http"));
    // "cpu" is gone entirely; "memory" starts from its declared default.
    assert_eq!(form.value("cpu"), None);
    assert_eq!(form.value("memory"), Some("1024"));
}

#[test]
fn test_retarget_records_selected_template_for_edits() {
    let mut form = InstanceForm::for_edit(&http_server(), &my_http());
    assert_eq!(form.selected_template(), None);

    form.retarget(&jupyter());
    assert_eq!(form.selected_template(), Some("jupyter"));

    let submission = form.submit();
    assert_eq!(submission.selected_template.as_deref(), Some("jupyter"));
}

#[test]
fn test_retarget_back_to_original_is_unchanged() {
    let mut form = InstanceForm::for_edit(&http_server(), &my_http());
    form.retarget(&jupyter());
    form.retarget(&http_server());

    assert_eq!(form.selected_template(), None);
    assert_eq!(form.submit().selected_template, None);
}

#[test]
fn test_retarget_on_create_form_never_signals_migration() {
    let mut form = InstanceForm::for_create(&http_server());
    form.retarget(&jupyter());

    assert_eq!(form.template_id(), "jupyter");
    assert_eq!(form.selected_template(), None);
    assert_eq!(form.submit().selected_template, None);
}

#[test]
fn test_submission_is_restricted_to_target_template_parameters() {
    let mut form = InstanceForm::for_edit(&http_server(), &my_http());
    form.retarget(&jupyter());
    form.set_value("memory", "2048");

    let submission = form.submit();
    let mut names: Vec<&String> = submission.parameter_values.keys().collect();
    names.sort();
    assert_eq!(names, vec!["id", "memory"]);
}
