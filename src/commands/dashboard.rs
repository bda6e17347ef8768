// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::YearMonth;
use crate::session::Session;
use crate::store::Store;
use crate::utils::{fmt_money, maybe_print_json, now, parse_month, pretty_table};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub month: String,
    pub income: Decimal,
    pub spent: Decimal,
    pub balance: Decimal,
    pub expenses: usize,
}

/// Snapshot of the presentation projections for `month` shifted by `shift`.
pub fn build(store: &mut Store, month: YearMonth, shift: i32) -> Result<Dashboard> {
    let mut session = Session::new(store, month);
    if shift != 0 {
        session.shift_month(shift)?;
    }
    let expenses = session.month_expenses()?;
    let incomes = session.incomes()?;
    let balance = session.balance()?;

    let spent: Decimal = expenses.borrow().iter().map(|e| e.amount).sum();
    let income: Decimal = incomes.borrow().iter().map(|i| i.amount).sum();
    let dashboard = Dashboard {
        month: session.month().to_string(),
        income,
        spent,
        balance: *balance.borrow(),
        expenses: expenses.borrow().len(),
    };
    Ok(dashboard)
}

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    let month = match m.get_one::<String>("month") {
        Some(s) => parse_month(s)?,
        None => YearMonth::of(now().date()).context("Current date has no calendar month")?,
    };
    let shift = m.get_one::<i32>("shift").copied().unwrap_or(0);
    let dashboard = build(store, month, shift)?;
    if !maybe_print_json(m.get_flag("json"), false, &dashboard)? {
        println!(
            "{}",
            pretty_table(
                &["Month", "Income", "Spent", "Balance", "Expenses"],
                vec![vec![
                    dashboard.month.clone(),
                    fmt_money(&dashboard.income),
                    fmt_money(&dashboard.spent),
                    fmt_money(&dashboard.balance),
                    dashboard.expenses.to_string(),
                ]],
            )
        );
    }
    Ok(())
}
