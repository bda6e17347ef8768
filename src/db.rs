// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::Store;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use once_cell::sync::{Lazy, OnceCell};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Cardclip", "cardclip"));

static SHARED: OnceCell<Mutex<Store>> = OnceCell::new();

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("cardclip.sqlite"))
}

pub fn open_or_init(path: Option<&Path>) -> Result<Connection> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => db_path()?,
    };
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    debug!("Opened database at {}", path.display());
    Ok(conn)
}

pub fn open_in_memory() -> Result<Store> {
    let mut conn = Connection::open_in_memory().context("Open in-memory DB")?;
    init_schema(&mut conn)?;
    Ok(Store::new(conn))
}

/// The process-wide store, opened on first use. `path` only matters for that first call.
pub fn shared(path: Option<&Path>) -> Result<MutexGuard<'static, Store>> {
    let store = SHARED.get_or_try_init(|| -> Result<Mutex<Store>> {
        Ok(Mutex::new(Store::new(open_or_init(path)?)))
    })?;
    store
        .lock()
        .map_err(|_| anyhow!("Database handle poisoned by an earlier panic"))
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bank TEXT NOT NULL,
        credit_limit TEXT NOT NULL,
        closing_day INTEGER NOT NULL,
        due_day INTEGER NOT NULL,
        notify INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS purchases(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_id INTEGER NOT NULL,
        description TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        installments INTEGER NOT NULL,
        purchased_at TEXT NOT NULL,
        paid_installments INTEGER NOT NULL DEFAULT 0,
        responsible TEXT NOT NULL DEFAULT 'self',
        FOREIGN KEY(card_id) REFERENCES cards(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_purchases_card ON purchases(card_id);

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL,
        spent_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_spent_at ON expenses(spent_at);

    CREATE TABLE IF NOT EXISTS incomes(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        source TEXT NOT NULL,
        frequency TEXT NOT NULL CHECK(frequency IN ('weekly','biweekly','monthly')),
        registered_at TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}
