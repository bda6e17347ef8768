// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use cardclip::{cli, commands, db};

fn main() -> ExitCode {
    let matches = cli::build_cli().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| s.as_str())
        .unwrap_or("warn");
    init_logger(level);
    debug!("Log level set to {level}");

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &clap::ArgMatches) -> Result<()> {
    let path = matches.get_one::<PathBuf>("db").cloned();
    let mut store = db::shared(path.as_deref())?;
    let store = &mut *store;

    match matches.subcommand() {
        Some(("init", _)) => match path {
            Some(p) => println!("Database initialized at {}", p.display()),
            None => println!("Database initialized at {}", db::db_path()?.display()),
        },
        Some(("card", sub)) => commands::cards::handle(store, sub)?,
        Some(("msi", sub)) => commands::purchases::handle(store, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(store, sub)?,
        Some(("income", sub)) => commands::income::handle(store, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(store, sub)?,
        Some(("scan", sub)) => commands::scan::handle(store, sub)?,
        Some(("config", sub)) => commands::config::handle(store, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(store)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG`, when set, wins over `level`.
fn init_logger(level: &str) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => {
            let level = if level == "none" { "off" } else { level };
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
