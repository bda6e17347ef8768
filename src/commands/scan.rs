// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::scanner::{self, CardScope, ConsoleSink, ScanReport};
use crate::store::Store;
use crate::utils::{now, parse_date};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    let mut sink = ConsoleSink::from_settings(store)?;
    let scope = if m.get_flag("notifying-only") {
        CardScope::Notifying
    } else {
        CardScope::All
    };

    if m.get_flag("daemon") {
        let minutes = m.get_one::<u64>("poll-minutes").copied().unwrap_or(60);
        info!("Scanner polling every {} minute(s)", minutes);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start scanner runtime")?;
        return rt.block_on(scanner::run_periodically(
            store,
            &mut sink,
            Duration::from_secs(minutes * 60),
            scope,
        ));
    }

    let report = match m.get_one::<String>("today") {
        Some(day) => Some(scanner::run_scan(store, &mut sink, parse_date(day)?, scope)?),
        None if m.get_flag("force") => {
            Some(scanner::run_scan(store, &mut sink, now().date(), scope)?)
        }
        None => scanner::run_if_due(store, &mut sink, now(), scope)?,
    };
    match report {
        Some(report) => print_summary(&report),
        None => println!("Scan already ran within the last {} hours", scanner::SCAN_INTERVAL_HOURS),
    }
    Ok(())
}

fn print_summary(report: &ScanReport) {
    if report.alerts.is_empty() {
        println!("No alerts");
    } else if report.permission_denied {
        println!(
            "{} alert(s) not shown: notifications are off (cardclip config set --key notifications --value on)",
            report.alerts.len()
        );
    }
}
