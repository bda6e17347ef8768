// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label carried by purchases the card holder pays for themselves.
pub const SELF_PARTY: &str = "self";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: i64,
    pub bank: String,
    pub credit_limit: Decimal,
    pub closing_day: u32,
    pub due_day: u32,
    pub notify: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub bank: String,
    pub credit_limit: Decimal,
    pub closing_day: u32,
    pub due_day: u32,
    pub notify: bool,
}

/// A fixed-installment purchase charged to a card. The monthly amount and the
/// remaining balance are derived, never stored; see [`crate::ledger::derive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPurchase {
    pub id: i64,
    pub card_id: i64,
    pub description: String,
    pub total_amount: Decimal,
    pub installments: u32,
    pub purchased_at: NaiveDateTime,
    pub paid_installments: u32,
    pub responsible: String,
}

impl InstallmentPurchase {
    pub fn is_self(&self) -> bool {
        self.responsible == SELF_PARTY
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub card_id: i64,
    pub description: String,
    pub total_amount: Decimal,
    pub installments: u32,
    pub purchased_at: NaiveDateTime,
    pub paid_installments: u32,
    pub responsible: String,
}

impl NewPurchase {
    /// A purchase with nothing paid yet. A blank `responsible` means the card holder.
    pub fn new(
        card_id: i64,
        description: impl Into<String>,
        total_amount: Decimal,
        installments: u32,
        purchased_at: NaiveDateTime,
        responsible: &str,
    ) -> Self {
        let responsible = responsible.trim();
        Self {
            card_id,
            description: description.into(),
            total_amount,
            installments,
            purchased_at,
            paid_installments: 0,
            responsible: if responsible.is_empty() {
                SELF_PARTY.to_string()
            } else {
                responsible.to_string()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyExpense {
    pub id: i64,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub spent_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub spent_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown frequency '{0}', expected weekly, biweekly or monthly")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeEntry {
    pub id: i64,
    pub amount: Decimal,
    pub source: String,
    pub frequency: Frequency,
    pub registered_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncome {
    pub amount: Decimal,
    pub source: String,
    pub frequency: Frequency,
    pub registered_at: NaiveDateTime,
}

/// A calendar month. Kept as its first and last day, so every value names a
/// real range of dates. Bounds use local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
    last: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
        Some(Self { first, last })
    }

    pub fn of(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// Moves `months` forward (or backward when negative), rolling the year.
    /// `None` when the result falls outside the supported calendar.
    pub fn shift(&self, months: i32) -> Option<Self> {
        let index = self
            .year()
            .checked_mul(12)?
            .checked_add(self.month() as i32 - 1)?
            .checked_add(months)?;
        Self::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    /// First and last instant of the month, both inclusive.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        // Wraps around midnight to 23:59:59.999999999
        let end_of_day = NaiveTime::MIN - Duration::nanoseconds(1);
        (
            self.first.and_time(NaiveTime::MIN),
            self.last.and_time(end_of_day),
        )
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

#[derive(Debug, Error)]
#[error("invalid month '{0}', expected YYYY-MM")]
pub struct ParseMonthError(String);

impl FromStr for YearMonth {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .ok()
            .and_then(Self::of)
            .ok_or_else(|| ParseMonthError(s.to_string()))
    }
}
