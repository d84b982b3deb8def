// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Broccoli Migration CLI
//!
//! One-shot copy of every instance from one Broccoli backend to another.
//!
//! Usage:
//!   broccoli-migrate <from> <to> [--yes]
//!
//! Reads all instances from the source backend and re-creates each one on
//! the destination from its template id and parameter values. Per-instance
//! failures are logged and skipped; the remaining migrations continue.

use std::io::Write;
use std::process::ExitCode;

use broccoli_client::{BroccoliClient, ClientConfig};

fn print_usage() {
    eprintln!(
        r#"Usage: broccoli-migrate <from> <to> [--yes]

Copy every instance from one Broccoli backend to another.

ARGUMENTS:
    <from>      Base URL of the source backend (e.g. http://old:9000)
    <to>        Base URL of the destination backend (e.g. http://new:9000)

OPTIONS:
    --yes       Skip the confirmation prompt

Each instance is re-created on the destination via POST /instances with the
source instance's template id and parameter values. A failure to migrate one
instance does not abort the rest.

EXAMPLES:
    broccoli-migrate http://old:9000 http://new:9000
    broccoli-migrate http://old:9000 http://new:9000 --yes
"#
    );
}

#[derive(Debug, PartialEq)]
struct Migration {
    from: String,
    to: String,
    assume_yes: bool,
}

fn parse_args_from_vec(args: &[String]) -> Result<Migration, String> {
    let mut from: Option<String> = None;
    let mut to: Option<String> = None;
    let mut assume_yes = false;

    for arg in &args[1..] {
        match arg.as_str() {
            "help" | "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--yes" | "-y" => assume_yes = true,
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            other => {
                if from.is_none() {
                    from = Some(other.to_string());
                } else if to.is_none() {
                    to = Some(other.to_string());
                } else {
                    return Err(format!("Unexpected argument: {}", other));
                }
            }
        }
    }

    Ok(Migration {
        from: from.ok_or("Source backend URL required")?,
        to: to.ok_or("Destination backend URL required")?,
        assume_yes,
    })
}

/// Ask for confirmation on stdin. Only a plain `y` proceeds.
fn confirm(from: &str, to: &str) -> bool {
    print!("Migrating instances from {} to {}? [y/n]: ", from, to);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim() == "y"
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let migration = match parse_args_from_vec(&args) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if !migration.assume_yes && !confirm(&migration.from, &migration.to) {
        println!("Exiting.");
        return ExitCode::SUCCESS;
    }

    let source = match BroccoliClient::new(ClientConfig::new(&migration.from)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid source backend {}: {}", migration.from, e);
            return ExitCode::FAILURE;
        }
    };
    let destination = match BroccoliClient::new(ClientConfig::new(&migration.to)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid destination backend {}: {}", migration.to, e);
            return ExitCode::FAILURE;
        }
    };

    let instances = match source.list_instances(None).await {
        Ok(instances) => instances,
        Err(e) => {
            eprintln!(
                "Error retrieving the instances from {}: {}",
                migration.from, e
            );
            return ExitCode::FAILURE;
        }
    };

    let total = instances.len();
    let mut migrated = 0usize;
    for instance in instances {
        println!("Migrating: {}", instance.id);
        match destination
            .create_instance(&instance.template.id, &instance.parameter_values)
            .await
        {
            Ok(_) => migrated += 1,
            Err(e) => {
                eprintln!(
                    "Error putting the instance {} to {}: {}",
                    instance.id, migration.to, e
                );
            }
        }
    }

    println!("Migrated {} of {} instances.", migrated, total);
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_both_urls() {
        let result =
            parse_args_from_vec(&args(&["broccoli-migrate", "http://old:9000", "http://new:9000"]));
        assert_eq!(
            result.unwrap(),
            Migration {
                from: "http://old:9000".to_string(),
                to: "http://new:9000".to_string(),
                assume_yes: false,
            }
        );
    }

    #[test]
    fn test_parse_missing_source() {
        let result = parse_args_from_vec(&args(&["broccoli-migrate"]));
        assert_eq!(result.unwrap_err(), "Source backend URL required");
    }

    #[test]
    fn test_parse_missing_destination() {
        let result = parse_args_from_vec(&args(&["broccoli-migrate", "http://old:9000"]));
        assert_eq!(result.unwrap_err(), "Destination backend URL required");
    }

    #[test]
    fn test_parse_yes_flag() {
        let result = parse_args_from_vec(&args(&[
            "broccoli-migrate",
            "http://old:9000",
            "http://new:9000",
            "--yes",
        ]));
        assert!(result.unwrap().assume_yes);
    }

    #[test]
    fn test_parse_rejects_extra_positional() {
        let result = parse_args_from_vec(&args(&[
            "broccoli-migrate",
            "http://a:9000",
            "http://b:9000",
            "http://c:9000",
        ]));
        assert!(result.unwrap_err().contains("Unexpected argument"));
    }

    #[test]
    fn test_parse_rejects_unknown_option() {
        let result = parse_args_from_vec(&args(&[
            "broccoli-migrate",
            "http://a:9000",
            "http://b:9000",
            "--force",
        ]));
        assert!(result.unwrap_err().contains("Unknown option"));
    }
}
