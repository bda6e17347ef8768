// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::YearMonth;
use crate::observe::RecordKind;
use thiserror::Error;

/// Failures reported by the ledger core and the store it runs on.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid installment purchase: {0}")]
    InvalidPurchase(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: i64 },
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("cannot move {month} by {months} month(s)")]
    MonthOutOfRange { month: YearMonth, months: i32 },
    #[error("failed to {operation}: {source}")]
    StoreWriteFailure {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("store query failed: {0}")]
    StoreRead(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Wraps a rusqlite error raised by a write as [`LedgerError::StoreWriteFailure`].
pub(crate) fn write_failure(operation: &'static str) -> impl Fn(rusqlite::Error) -> LedgerError {
    move |source| LedgerError::StoreWriteFailure { operation, source }
}
