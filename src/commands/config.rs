// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::settings::{self, KNOWN_KEYS, LAST_SCAN_AT, NOTIFICATIONS};
use crate::store::Store;
use crate::utils::{arg, pretty_table};
use anyhow::{bail, Result};

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let keys: Vec<&str> = match sub.get_one::<String>("key") {
                Some(k) => vec![known_key(k)?],
                None => KNOWN_KEYS.to_vec(),
            };
            let mut rows = Vec::new();
            for key in keys {
                let value = match key {
                    NOTIFICATIONS => {
                        if settings::notifications_enabled(store)? {
                            "on".to_string()
                        } else {
                            "off".to_string()
                        }
                    }
                    _ => store.setting(key)?.unwrap_or_else(|| "-".to_string()),
                };
                rows.push(vec![key.to_string(), value]);
            }
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        Some(("set", sub)) => {
            let key = known_key(arg(sub, "key")?)?;
            let value = arg(sub, "value")?;
            match key {
                NOTIFICATIONS => settings::set_notifications(store, settings::parse_switch(value)?)?,
                LAST_SCAN_AT => {
                    let ts = settings::parse_timestamp(value)?;
                    store.set_setting(LAST_SCAN_AT, &settings::format_timestamp(ts))?;
                }
                _ => bail!("Setting '{}' cannot be changed", key),
            }
            println!("Set {} = {}", key, value.trim());
        }
        _ => {}
    }
    Ok(())
}

fn known_key(key: &str) -> Result<&'static str> {
    let key = key.trim();
    match KNOWN_KEYS.iter().find(|k| **k == key) {
        Some(k) => Ok(k),
        None => bail!("Unknown setting '{}', expected one of {}", key, KNOWN_KEYS.join(", ")),
    }
}
