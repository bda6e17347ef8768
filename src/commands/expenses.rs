// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::monthly_expense_total;
use crate::models::{DailyExpense, NewExpense};
use crate::store::Store;
use crate::utils::{
    arg, arg_id, fmt_money, fmt_timestamp, maybe_print_json, parse_date, parse_decimal,
    parse_month, pretty_table, timestamp_on,
};
use anyhow::Result;
use serde::Serialize;

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => {
            let id = arg_id(sub, "id")?;
            store.delete_expense(id)?;
            println!("Removed expense {}", id);
        }
        Some(("total", sub)) => total(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &mut Store, sub: &clap::ArgMatches) -> Result<()> {
    let category = arg(sub, "category")?.trim().to_string();
    let description = match sub.get_one::<String>("desc").map(|s| s.trim()) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => category.clone(),
    };
    let date = sub
        .get_one::<String>("date")
        .map(|d| parse_date(d))
        .transpose()?;
    let expense = store.insert_expense(&NewExpense {
        amount: parse_decimal(arg(sub, "amount")?)?,
        description,
        category,
        spent_at: timestamp_on(date),
    })?;
    println!(
        "Recorded {} '{}' ({}) on {}",
        fmt_money(&expense.amount),
        expense.description,
        expense.category,
        fmt_timestamp(&expense.spent_at)
    );
    Ok(())
}

pub fn query_rows(store: &Store, sub: &clap::ArgMatches) -> Result<Vec<DailyExpense>> {
    Ok(match sub.get_one::<String>("month") {
        Some(month) => {
            let (start, end) = parse_month(month)?.bounds();
            store.expenses_between(start, end)?
        }
        None => store.expenses()?,
    })
}

fn list(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(store, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    fmt_timestamp(&e.spent_at),
                    e.description.clone(),
                    e.category.clone(),
                    fmt_money(&e.amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "When", "Description", "Category", "Amount"], rows)
        );
    }
    Ok(())
}

fn edit(store: &mut Store, sub: &clap::ArgMatches) -> Result<()> {
    let mut expense = store.expense(arg_id(sub, "id")?)?;
    if let Some(amount) = sub.get_one::<String>("amount") {
        expense.amount = parse_decimal(amount)?;
    }
    if let Some(desc) = sub.get_one::<String>("desc") {
        expense.description = desc.trim().to_string();
    }
    if let Some(category) = sub.get_one::<String>("category") {
        expense.category = category.trim().to_string();
    }
    if let Some(date) = sub.get_one::<String>("date") {
        expense.spent_at = parse_date(date)?.and_time(expense.spent_at.time());
    }
    store.update_expense(&expense)?;
    println!("Updated expense {}", expense.id);
    Ok(())
}

#[derive(Debug, Serialize)]
struct MonthTotal {
    month: String,
    total: rust_decimal::Decimal,
}

fn total(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(sub, "month")?)?;
    let total = monthly_expense_total(store, month.year(), month.month())?;
    let out = MonthTotal {
        month: month.to_string(),
        total,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        println!("Spent {} in {}", fmt_money(&out.total), out.month);
    }
    Ok(())
}
