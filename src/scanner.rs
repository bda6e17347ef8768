// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The periodic scanner: reads a snapshot of cards and purchases and raises
//! statement-closing and near-completion alerts.
//!
//! Scans are gated by a timestamp persisted in the settings table, so a run
//! happens at most once per [`SCAN_INTERVAL_HOURS`] even across restarts, and
//! the gate is claimed inside an immediate transaction so two processes never
//! scan concurrently. A scan that fails hands its slot back, so the next
//! attempt re-delivers instead of waiting out the interval.

use crate::ledger::{closing_alert_days, completion_alert_due, derive};
use crate::settings::{self, LAST_SCAN_AT};
use crate::store::Store;
use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub const SCAN_INTERVAL_HOURS: i64 = 24;

/// Added to purchase ids so completion alerts never collide with card ids.
pub const COMPLETION_ALERT_ID_OFFSET: i64 = 1 << 32;

/// Which cards a scan reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardScope {
    #[default]
    All,
    /// Only cards whose `notify` flag is on.
    Notifying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StatementClosing,
    NearCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub id: i64,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

/// Where alerts go. Delivery is skipped entirely without permission.
pub trait AlertSink {
    fn permission_granted(&self) -> bool;
    fn deliver(&mut self, alert: &Alert) -> Result<()>;
}

/// Prints alerts to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    granted: bool,
}

impl ConsoleSink {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }

    pub fn from_settings(store: &Store) -> Result<Self> {
        Ok(Self::new(settings::notifications_enabled(store)?))
    }
}

impl AlertSink for ConsoleSink {
    fn permission_granted(&self) -> bool {
        self.granted
    }

    fn deliver(&mut self, alert: &Alert) -> Result<()> {
        println!("[{}] {}\n    {}", alert.id, alert.title, alert.message);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub alerts: Vec<Alert>,
    pub delivered: usize,
    pub permission_denied: bool,
}

/// Alerts due on `today`. A purchase that cannot be read or fails validation
/// is logged and skipped; it never hides alerts for the rest of the ledger.
pub fn collect_alerts(store: &Store, today: NaiveDate, scope: CardScope) -> Result<Vec<Alert>> {
    let day = today.day();
    let cards = match scope {
        CardScope::All => store.cards()?,
        CardScope::Notifying => store.cards_with_alerts()?,
    };
    let mut alerts = Vec::new();
    for card in cards {
        if let Some(days) = closing_alert_days(card.closing_day, day) {
            alerts.push(Alert {
                id: card.id,
                kind: AlertKind::StatementClosing,
                title: format!("Statement closing soon: {}", card.bank),
                message: format!(
                    "Your card closes in {} day(s) (day {}). Review your spending.",
                    days, card.closing_day
                ),
            });
        }

        let purchases = match store.purchases_for_card(card.id) {
            Ok(purchases) => purchases,
            Err(e) => {
                warn!("Skipping purchases of card {}: {e}", card.id);
                continue;
            }
        };
        for purchase in purchases {
            let figures = match derive(&purchase) {
                Ok(figures) => figures,
                Err(e) => {
                    warn!("Skipping purchase {} on card {}: {e}", purchase.id, card.id);
                    continue;
                }
            };
            if completion_alert_due(figures.remaining_count) {
                alerts.push(Alert {
                    id: purchase.id + COMPLETION_ALERT_ID_OFFSET,
                    kind: AlertKind::NearCompletion,
                    title: "Almost paid off!".to_string(),
                    message: format!(
                        "Only {} payment(s) left on: {}",
                        figures.remaining_count, purchase.description
                    ),
                });
            }
        }
    }
    Ok(alerts)
}

pub fn run_scan<S: AlertSink>(
    store: &Store,
    sink: &mut S,
    today: NaiveDate,
    scope: CardScope,
) -> Result<ScanReport> {
    let alerts = collect_alerts(store, today, scope)?;
    let mut report = ScanReport {
        alerts,
        delivered: 0,
        permission_denied: false,
    };
    if report.alerts.is_empty() {
        debug!("Scan for {today} raised no alerts");
        return Ok(report);
    }
    if !sink.permission_granted() {
        warn!(
            "Notification permission not granted, skipping {} alert(s)",
            report.alerts.len()
        );
        report.permission_denied = true;
        return Ok(report);
    }
    for alert in &report.alerts {
        sink.deliver(alert)
            .with_context(|| format!("Failed to deliver alert {}", alert.id))?;
        info!("Delivered alert {}: {}", alert.id, alert.title);
        report.delivered += 1;
    }
    Ok(report)
}

/// Runs a scan unless one already ran within the last [`SCAN_INTERVAL_HOURS`].
///
/// The slot is only kept when the scan succeeds; on failure `last_scan_at`
/// goes back to its previous value.
pub fn run_if_due<S: AlertSink>(
    store: &mut Store,
    sink: &mut S,
    now: NaiveDateTime,
    scope: CardScope,
) -> Result<Option<ScanReport>> {
    let Some(previous) = claim_run(store, now)? else {
        debug!("Scan not due yet");
        return Ok(None);
    };
    match run_scan(store, sink, now.date(), scope) {
        Ok(report) => Ok(Some(report)),
        Err(e) => {
            warn!("Scan failed, releasing its slot: {e:#}");
            if let Err(release) = release_claim(store, now, previous.as_deref()) {
                error!("Failed to release scan slot: {release:#}");
            }
            Err(e)
        }
    }
}

/// Claims the scan slot for `now`. `None` when a scan is not due yet,
/// otherwise the `last_scan_at` value the claim replaced.
fn claim_run(store: &mut Store, now: NaiveDateTime) -> Result<Option<Option<String>>> {
    let tx = store
        .conn_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to lock scan schedule")?;
    let last: Option<String> = tx
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![LAST_SCAN_AT],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(last) = &last {
        let last = settings::parse_timestamp(last)?;
        if now.signed_duration_since(last) < Duration::hours(SCAN_INTERVAL_HOURS) {
            return Ok(None);
        }
    }
    tx.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![LAST_SCAN_AT, settings::format_timestamp(now)],
    )?;
    tx.commit().context("Failed to record scan time")?;
    Ok(Some(last))
}

/// Puts back `previous` unless another run has claimed the slot since.
fn release_claim(store: &Store, claimed: NaiveDateTime, previous: Option<&str>) -> Result<()> {
    let ours = settings::format_timestamp(claimed);
    match previous {
        Some(previous) => store.conn().execute(
            "UPDATE settings SET value=?1 WHERE key=?2 AND value=?3",
            params![previous, LAST_SCAN_AT, ours],
        )?,
        None => store.conn().execute(
            "DELETE FROM settings WHERE key=?1 AND value=?2",
            params![LAST_SCAN_AT, ours],
        )?,
    };
    Ok(())
}

/// Wakes every `poll` and scans when due, until interrupted with Ctrl-C.
pub async fn run_periodically<S: AlertSink>(
    store: &mut Store,
    sink: &mut S,
    poll: std::time::Duration,
    scope: CardScope,
) -> Result<()> {
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_if_due(store, sink, Local::now().naive_local(), scope) {
                    Ok(Some(report)) => info!(
                        "Scan raised {} alert(s), delivered {}",
                        report.alerts.len(),
                        report.delivered
                    ),
                    Ok(None) => {}
                    Err(e) => error!("Scan failed: {e:#}"),
                }
            }
            res = tokio::signal::ctrl_c() => {
                res.context("Failed to listen for Ctrl-C")?;
                info!("Stopping scanner");
                return Ok(());
            }
        }
    }
}
