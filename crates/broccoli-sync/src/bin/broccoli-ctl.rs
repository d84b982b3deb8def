// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Broccoli Control CLI
//!
//! Operator console for a Cluster Broccoli backend.
//!
//! Usage:
//!   broccoli-ctl <command> [options]
//!
//! Commands:
//!   about                         Show backend name, version and permission mode
//!   templates                     List templates
//!   instances [--template <id>]   List instances
//!   create --template <id> [--param k=v ...]
//!   edit <instance_id> [--param k=v ...] [--migrate <template_id>]
//!   start <instance_id>
//!   stop <instance_id>
//!   delete <instance_id>
//!   watch [--interval <ms>]       Poll continuously and print changes

use std::process::ExitCode;
use std::sync::Arc;

use broccoli_client::{
    BroccoliClient, ClientConfig, Credentials, EditInstancePayload, InstanceStatus,
};
use broccoli_sync::{InstanceForm, Mirror, Session, SyncConfig, Synchronizer};

fn print_usage() {
    eprintln!(
        r#"Usage: broccoli-ctl <command> [options]

Operate a Cluster Broccoli backend.

COMMANDS:
    about                           Show backend name, version and permission mode
    templates                       List templates
    instances                       List instances
    create                          Create an instance from a template
    edit <instance_id>              Edit an instance's parameters
    start <instance_id>             Start an instance
    stop <instance_id>              Stop an instance
    delete <instance_id>            Delete an instance
    watch                           Poll continuously and print changes

INSTANCES OPTIONS:
    --template <id>                 Restrict to one template

CREATE OPTIONS:
    --template <id>                 Template to instantiate (required)
    --param <name>=<value>          Parameter value (repeatable)

EDIT OPTIONS:
    --param <name>=<value>          Parameter value (repeatable)
    --migrate <template_id>         Migrate the instance to another template

WATCH OPTIONS:
    --interval <ms>                 Poll interval in ms (minimum 1000)

ENVIRONMENT:
    BROCCOLI_ADDR                   Backend base URL (default: http://127.0.0.1:9000)
    BROCCOLI_USER                   Username for POST /auth/login
    BROCCOLI_PASSWORD               Password for POST /auth/login

EXAMPLES:
    # Create an http-server instance
    broccoli-ctl create --template http-server --param id=my-http --param cpu=250

    # Migrate an instance to another template while editing
    broccoli-ctl edit my-http --migrate jupyter --param id=my-http

    # Follow the cluster state
    broccoli-ctl watch --interval 2000
"#
    );
}

#[derive(Debug)]
enum Command {
    About,
    Templates,
    Instances {
        template_id: Option<String>,
    },
    Create {
        template_id: String,
        params: Vec<(String, String)>,
    },
    Edit {
        instance_id: String,
        params: Vec<(String, String)>,
        migrate: Option<String>,
    },
    Start {
        instance_id: String,
    },
    Stop {
        instance_id: String,
    },
    Delete {
        instance_id: String,
    },
    Watch {
        interval_ms: Option<u64>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("--param expects <name>=<value>, got: {}", raw)),
    }
}

fn parse_args_from_vec(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            std::process::exit(0);
        }
        "about" => Ok(Command::About),
        "templates" => Ok(Command::Templates),
        "instances" => {
            let mut template_id: Option<String> = None;
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--template" => {
                        i += 1;
                        template_id =
                            Some(args.get(i).ok_or("--template requires an id")?.clone());
                    }
                    other => return Err(format!("Unknown option: {}", other)),
                }
                i += 1;
            }
            Ok(Command::Instances { template_id })
        }
        "create" => {
            let mut template_id: Option<String> = None;
            let mut params = Vec::new();
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--template" => {
                        i += 1;
                        template_id =
                            Some(args.get(i).ok_or("--template requires an id")?.clone());
                    }
                    "--param" => {
                        i += 1;
                        params.push(parse_param(
                            args.get(i).ok_or("--param requires <name>=<value>")?,
                        )?);
                    }
                    other => return Err(format!("Unknown option: {}", other)),
                }
                i += 1;
            }
            Ok(Command::Create {
                template_id: template_id.ok_or("--template is required")?,
                params,
            })
        }
        "edit" => {
            let instance_id = args
                .get(2)
                .filter(|a| !a.starts_with('-'))
                .ok_or("Instance ID required")?
                .clone();
            let mut params = Vec::new();
            let mut migrate: Option<String> = None;
            let mut i = 3;
            while i < args.len() {
                match args[i].as_str() {
                    "--param" => {
                        i += 1;
                        params.push(parse_param(
                            args.get(i).ok_or("--param requires <name>=<value>")?,
                        )?);
                    }
                    "--migrate" => {
                        i += 1;
                        migrate = Some(args.get(i).ok_or("--migrate requires an id")?.clone());
                    }
                    other => return Err(format!("Unknown option: {}", other)),
                }
                i += 1;
            }
            Ok(Command::Edit {
                instance_id,
                params,
                migrate,
            })
        }
        "start" => {
            let instance_id = args.get(2).ok_or("Instance ID required")?.clone();
            Ok(Command::Start { instance_id })
        }
        "stop" => {
            let instance_id = args.get(2).ok_or("Instance ID required")?.clone();
            Ok(Command::Stop { instance_id })
        }
        "delete" => {
            let instance_id = args.get(2).ok_or("Instance ID required")?.clone();
            Ok(Command::Delete { instance_id })
        }
        "watch" => {
            let mut interval_ms: Option<u64> = None;
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--interval" => {
                        i += 1;
                        let raw = args.get(i).ok_or("--interval requires milliseconds")?;
                        interval_ms = Some(
                            raw.parse()
                                .map_err(|_| format!("Invalid interval: {}", raw))?,
                        );
                    }
                    other => return Err(format!("Unknown option: {}", other)),
                }
                i += 1;
            }
            Ok(Command::Watch { interval_ms })
        }
        cmd => Err(format!("Unknown command: {}", cmd)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine; the environment alone may carry the config.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "broccoli_sync=info".into()),
        )
        .init();

    let cmd = match parse_args_from_vec(&std::env::args().collect::<Vec<_>>()) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match ClientConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match BroccoliClient::new(config) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let (Ok(username), Ok(password)) = (
        std::env::var("BROCCOLI_USER"),
        std::env::var("BROCCOLI_PASSWORD"),
    ) {
        if let Err(e) = client.login(&Credentials::new(username, password)).await {
            eprintln!("Login failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    match execute_command(&client, cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute_command(client: &Arc<BroccoliClient>, cmd: Command) -> Result<(), String> {
    match cmd {
        Command::About => {
            let about = client.about().await.map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&about).map_err(|e| e.to_string())?
            );
        }

        Command::Templates => {
            let templates = client.list_templates().await.map_err(|e| e.to_string())?;
            for template in templates {
                println!(
                    "{} ({})  {}",
                    template.id,
                    template.short_version(),
                    template.description
                );
            }
        }

        Command::Instances { template_id } => {
            let instances = client
                .list_instances(template_id.as_deref())
                .await
                .map_err(|e| e.to_string())?;
            for instance in instances {
                println!("{} [{}]  ({})", instance.id, instance.status, instance.template.id);
            }
        }

        Command::Create {
            template_id,
            params,
        } => {
            let template = client
                .get_template(&template_id)
                .await
                .map_err(|e| e.to_string())?;

            let mut form = InstanceForm::for_create(&template);
            for (name, value) in params {
                if !form.set_value(&name, value) {
                    return Err(format!(
                        "Unknown parameter {} for template {}",
                        name, template.id
                    ));
                }
            }

            let submission = form.submit();
            let instance = client
                .create_instance(&template_id, &submission.parameter_values)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&instance).map_err(|e| e.to_string())?
            );
        }

        Command::Edit {
            instance_id,
            params,
            migrate,
        } => {
            let instances = client.list_instances(None).await.map_err(|e| e.to_string())?;
            let instance = instances
                .into_iter()
                .find(|instance| instance.id == instance_id)
                .ok_or_else(|| format!("Instance not found: {}", instance_id))?;

            let mut form = InstanceForm::for_edit(&instance.template, &instance);
            if let Some(target) = migrate {
                let template = client.get_template(&target).await.map_err(|e| e.to_string())?;
                form.retarget(&template);
            }
            for (name, value) in params {
                if !form.set_value(&name, value) {
                    return Err(format!(
                        "Unknown parameter {} for template {}",
                        name,
                        form.template_id()
                    ));
                }
            }

            let submission = form.submit();
            let mut payload = EditInstancePayload::new(submission.parameter_values);
            if let Some(template_id) = submission.selected_template {
                payload = payload.with_selected_template(template_id);
            }

            let updated = client
                .edit_instance(&instance_id, &payload)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&updated).map_err(|e| e.to_string())?
            );
        }

        Command::Start { instance_id } => {
            let snapshot = client
                .set_instance_status(&instance_id, InstanceStatus::Running)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?
            );
        }

        Command::Stop { instance_id } => {
            let snapshot = client
                .set_instance_status(&instance_id, InstanceStatus::Stopped)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?
            );
        }

        Command::Delete { instance_id } => {
            client
                .delete_instance(&instance_id)
                .await
                .map_err(|e| e.to_string())?;
            println!("Deleted: {}", instance_id);
        }

        Command::Watch { interval_ms } => {
            watch(client.clone(), interval_ms).await?;
        }
    }

    Ok(())
}

/// Run the full synchronizer stack and print the mirror on every change
/// until Ctrl-C.
async fn watch(client: Arc<BroccoliClient>, interval_ms: Option<u64>) -> Result<(), String> {
    let mut config = SyncConfig::default();
    if let Some(ms) = interval_ms {
        config = config.with_poll_interval(std::time::Duration::from_millis(ms));
    }

    let mirror = Mirror::new();
    let session = Session::new();
    let handle =
        Synchronizer::new(client.clone(), mirror.clone(), session.clone(), config).spawn();

    println!("Watching {} (Ctrl-C to stop)", client.base_url());

    let mut changes = mirror.subscribe();
    let mut reachable = session.subscribe_reachable();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            result = changes.changed() => {
                if result.is_err() {
                    break;
                }
                print_mirror(&mirror).await;
            }
            result = reachable.changed() => {
                if result.is_err() {
                    break;
                }
                if !*reachable.borrow() {
                    println!("-- backend unreachable, showing last known state --");
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn print_mirror(mirror: &Mirror) {
    if let Some(about) = mirror.about().await {
        println!("== {} {} ({})", about.name, about.version, about.permission_mode);
    } else {
        println!("==");
    }
    for entry in mirror.entries().await {
        println!(
            "{} ({})  {} instance(s)",
            entry.template.id,
            entry.template.short_version(),
            entry.instances.len()
        );
        let mut instances: Vec<_> = entry.instances.values().collect();
        instances.sort_by(|a, b| a.id.cmp(&b.id));
        for instance in instances {
            println!("  {} [{}]", instance.id, instance.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_no_command() {
        let result = parse_args_from_vec(&args(&["broccoli-ctl"]));
        assert_eq!(result.unwrap_err(), "No command specified");
    }

    #[test]
    fn test_parse_unknown_command() {
        let result = parse_args_from_vec(&args(&["broccoli-ctl", "destroy"]));
        assert!(result.unwrap_err().contains("Unknown command"));
    }

    #[test]
    fn test_parse_about() {
        assert!(matches!(
            parse_args_from_vec(&args(&["broccoli-ctl", "about"])).unwrap(),
            Command::About
        ));
    }

    #[test]
    fn test_parse_instances_with_template() {
        let cmd = parse_args_from_vec(&args(&[
            "broccoli-ctl",
            "instances",
            "--template",
            "http-server",
        ]))
        .unwrap();
        match cmd {
            Command::Instances { template_id } => {
                assert_eq!(template_id.as_deref(), Some("http-server"));
            }
            other => panic!("Expected Instances, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_requires_template() {
        let result = parse_args_from_vec(&args(&["broccoli-ctl", "create"]));
        assert!(result.unwrap_err().contains("--template is required"));
    }

    #[test]
    fn test_parse_create_with_params() {
        let cmd = parse_args_from_vec(&args(&[
            "broccoli-ctl",
            "create",
            "--template",
            "http-server",
            "--param",
            "id=my-http",
            "--param",
            "cpu=250",
        ]))
        .unwrap();
        match cmd {
            Command::Create {
                template_id,
                params,
            } => {
                assert_eq!(template_id, "http-server");
                assert_eq!(params.len(), 2);
                assert_eq!(params[0], ("id".to_string(), "my-http".to_string()));
            }
            other => panic!("Expected Create, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_param_requires_equals() {
        let result = parse_args_from_vec(&args(&[
            "broccoli-ctl",
            "create",
            "--template",
            "t",
            "--param",
            "cpu",
        ]));
        assert!(result.unwrap_err().contains("--param expects"));
    }

    #[test]
    fn test_parse_edit_with_migration() {
        let cmd = parse_args_from_vec(&args(&[
            "broccoli-ctl",
            "edit",
            "my-http",
            "--migrate",
            "jupyter",
            "--param",
            "id=my-http",
        ]))
        .unwrap();
        match cmd {
            Command::Edit {
                instance_id,
                params,
                migrate,
            } => {
                assert_eq!(instance_id, "my-http");
                assert_eq!(migrate.as_deref(), Some("jupyter"));
                assert_eq!(params.len(), 1);
            }
            other => panic!("Expected Edit, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_edit_requires_instance_id() {
        let result = parse_args_from_vec(&args(&["broccoli-ctl", "edit", "--param", "a=b"]));
        assert_eq!(result.unwrap_err(), "Instance ID required");
    }

    #[test]
    fn test_parse_start_stop_delete() {
        assert!(matches!(
            parse_args_from_vec(&args(&["broccoli-ctl", "start", "x"])).unwrap(),
            Command::Start { .. }
        ));
        assert!(matches!(
            parse_args_from_vec(&args(&["broccoli-ctl", "stop", "x"])).unwrap(),
            Command::Stop { .. }
        ));
        assert!(matches!(
            parse_args_from_vec(&args(&["broccoli-ctl", "delete", "x"])).unwrap(),
            Command::Delete { .. }
        ));
    }

    #[test]
    fn test_parse_watch_interval() {
        let cmd = parse_args_from_vec(&args(&["broccoli-ctl", "watch", "--interval", "2000"]))
            .unwrap();
        match cmd {
            Command::Watch { interval_ms } => assert_eq!(interval_ms, Some(2000)),
            other => panic!("Expected Watch, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_watch_invalid_interval() {
        let result =
            parse_args_from_vec(&args(&["broccoli-ctl", "watch", "--interval", "soon"]));
        assert!(result.unwrap_err().contains("Invalid interval"));
    }
}
