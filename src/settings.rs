// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::Store;
use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;

pub const NOTIFICATIONS: &str = "notifications";
pub const LAST_SCAN_AT: &str = "last_scan_at";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keys accepted by `config get|set`.
pub const KNOWN_KEYS: &[&str] = &[NOTIFICATIONS, LAST_SCAN_AT];

/// Whether alert delivery is permitted. Defaults to on until switched off.
pub fn notifications_enabled(store: &Store) -> Result<bool> {
    match store.setting(NOTIFICATIONS)? {
        None => Ok(true),
        Some(v) => parse_switch(&v),
    }
}

pub fn set_notifications(store: &Store, enabled: bool) -> Result<()> {
    store.set_setting(NOTIFICATIONS, if enabled { "on" } else { "off" })?;
    Ok(())
}

pub fn last_scan_at(store: &Store) -> Result<Option<NaiveDateTime>> {
    store
        .setting(LAST_SCAN_AT)?
        .map(|v| parse_timestamp(&v))
        .transpose()
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid timestamp '{}', expected YYYY-MM-DD HH:MM:SS", s))
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_switch(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("Invalid switch '{}', expected on or off", other),
    }
}
