// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Observable queries.
//!
//! A query is registered together with the record kinds it reads. Every write
//! to one of those kinds re-runs the query and broadcasts the full result over
//! a `watch` channel. Queries whose receivers have all been dropped are pruned
//! on the next refresh.

use crate::error::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Card,
    Purchase,
    Expense,
    Income,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Card => "card",
            RecordKind::Purchase => "purchase",
            RecordKind::Expense => "expense",
            RecordKind::Income => "income",
        })
    }
}

type Refresh = Box<dyn FnMut(&Connection) -> Result<bool> + Send>;

struct Subscription {
    reads: Vec<RecordKind>,
    refresh: Refresh,
}

#[derive(Default)]
pub struct Registry {
    subscriptions: Vec<Subscription>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl Registry {
    /// Evaluates `query` once for the initial value and keeps it for re-evaluation.
    pub fn register<T, F>(
        &mut self,
        conn: &Connection,
        reads: &[RecordKind],
        mut query: F,
    ) -> Result<watch::Receiver<T>>
    where
        T: Send + Sync + 'static,
        F: FnMut(&Connection) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = watch::channel(query(conn)?);
        let refresh: Refresh = Box::new(move |conn| {
            if tx.is_closed() {
                return Ok(false);
            }
            tx.send_replace(query(conn)?);
            Ok(true)
        });
        self.subscriptions.push(Subscription {
            reads: reads.to_vec(),
            refresh,
        });
        Ok(rx)
    }

    /// Re-broadcasts every live query that reads any of `kinds`.
    pub fn notify(&mut self, conn: &Connection, kinds: &[RecordKind]) {
        self.subscriptions.retain_mut(|sub| {
            if !sub.reads.iter().any(|k| kinds.contains(k)) {
                return true;
            }
            match (sub.refresh)(conn) {
                Ok(alive) => {
                    if !alive {
                        trace!("Dropping subscription with no receivers");
                    }
                    alive
                }
                Err(e) => {
                    warn!("Observable query refresh failed: {e}");
                    true
                }
            }
        });
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
