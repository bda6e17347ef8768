// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, aggregate_with, derive, Obligation, ObligationPolicy};
use crate::models::{InstallmentPurchase, NewPurchase, SELF_PARTY};
use crate::store::Store;
use crate::utils::{
    arg, arg_id, fmt_money, maybe_print_json, now, parse_date, parse_decimal, pretty_table,
    timestamp_on,
};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => {
            let id = arg_id(sub, "id")?;
            store.delete_purchase(id)?;
            println!("Removed purchase {}", id);
        }
        Some(("summary", sub)) => summary(store, sub)?,
        Some(("pay", sub)) => pay(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &mut Store, sub: &clap::ArgMatches) -> Result<()> {
    let date = sub
        .get_one::<String>("date")
        .map(|d| parse_date(d))
        .transpose()?;
    let purchase = NewPurchase::new(
        arg_id(sub, "card")?,
        arg(sub, "desc")?.trim(),
        parse_decimal(arg(sub, "total")?)?,
        *sub.get_one::<u32>("installments").unwrap_or(&0),
        timestamp_on(date),
        sub.get_one::<String>("debtor").map(|s| s.as_str()).unwrap_or(""),
    );
    let purchase = store.insert_purchase(&purchase)?;
    let figures = derive(&purchase)?;
    println!(
        "Recorded '{}' on card {}: {} x {}",
        purchase.description,
        purchase.card_id,
        purchase.installments,
        fmt_money(&figures.monthly_amount)
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PurchaseRow {
    pub id: i64,
    pub description: String,
    pub responsible: String,
    pub total_amount: Decimal,
    pub monthly_amount: Decimal,
    pub paid: u32,
    pub installments: u32,
    pub remaining_count: u32,
    pub remaining_balance: Decimal,
}

pub fn purchase_rows(store: &Store, card_id: i64) -> Result<Vec<PurchaseRow>> {
    store.card(card_id)?;
    let mut rows = Vec::new();
    for p in store.purchases_for_card(card_id)? {
        let figures = derive(&p)?;
        rows.push(PurchaseRow {
            id: p.id,
            description: p.description,
            responsible: p.responsible,
            total_amount: p.total_amount,
            monthly_amount: figures.monthly_amount,
            paid: p.paid_installments,
            installments: p.installments,
            remaining_count: figures.remaining_count,
            remaining_balance: figures.remaining_balance,
        });
    }
    Ok(rows)
}

fn list(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let data = purchase_rows(store, arg_id(sub, "card")?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.description.clone(),
                    r.responsible.clone(),
                    fmt_money(&r.total_amount),
                    fmt_money(&r.monthly_amount),
                    format!("{}/{}", r.paid, r.installments),
                    fmt_money(&r.remaining_balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Description", "Debtor", "Total", "Monthly", "Paid", "Remaining"],
                rows,
            )
        );
    }
    Ok(())
}

fn edit(store: &mut Store, sub: &clap::ArgMatches) -> Result<()> {
    let mut purchase: InstallmentPurchase = store.purchase(arg_id(sub, "id")?)?;
    if let Some(card) = sub.get_one::<i64>("card") {
        purchase.card_id = *card;
    }
    if let Some(desc) = sub.get_one::<String>("desc") {
        purchase.description = desc.trim().to_string();
    }
    if let Some(total) = sub.get_one::<String>("total") {
        purchase.total_amount = parse_decimal(total)?;
    }
    if let Some(n) = sub.get_one::<u32>("installments") {
        purchase.installments = *n;
    }
    if let Some(paid) = sub.get_one::<u32>("paid") {
        purchase.paid_installments = *paid;
    }
    if let Some(debtor) = sub.get_one::<String>("debtor") {
        let debtor = debtor.trim();
        purchase.responsible = if debtor.is_empty() {
            SELF_PARTY.to_string()
        } else {
            debtor.to_string()
        };
    }
    store.update_purchase(&purchase)?;
    println!(
        "Updated purchase {} ({}/{} paid)",
        purchase.id, purchase.paid_installments, purchase.installments
    );
    Ok(())
}

pub fn summarize(store: &Store, card_id: i64, policy: ObligationPolicy) -> Result<Obligation> {
    store.card(card_id)?;
    Ok(aggregate_with(&store.purchases_for_card(card_id)?, policy)?)
}

fn summary(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let policy = if sub.get_flag("include-completed") {
        ObligationPolicy::IncludeCompleted
    } else {
        ObligationPolicy::OpenOnly
    };
    let obligation = summarize(store, arg_id(sub, "card")?, policy)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &obligation)? {
        let mut rows = vec![
            vec!["Due to bank".to_string(), fmt_money(&obligation.total_due)],
            vec!["Yours".to_string(), fmt_money(&obligation.self_due)],
        ];
        for (debtor, due) in &obligation.per_debtor_due {
            rows.push(vec![format!("Owed by {}", debtor), fmt_money(due)]);
        }
        println!("{}", pretty_table(&["This month", "Amount"], rows));
    }
    Ok(())
}

fn pay(store: &mut Store, sub: &clap::ArgMatches) -> Result<()> {
    let card_id = arg_id(sub, "card")?;
    if sub.get_flag("dry-run") {
        let amount = ledger::preview_payment(store, card_id)?;
        println!(
            "Paying card {} now would process {}",
            card_id,
            fmt_money(&amount)
        );
        return Ok(());
    }
    let payment = ledger::pay_month(store, card_id, sub.get_flag("record-expense"), now())?;
    if payment.advanced.is_empty() {
        println!("Nothing left to pay on card {}", card_id);
    } else {
        println!(
            "Paid {} on card {} ({} purchase(s) advanced{})",
            fmt_money(&payment.total_paid),
            card_id,
            payment.advanced.len(),
            if payment.expense_id.is_some() {
                ", expense recorded"
            } else {
                ""
            }
        );
    }
    Ok(())
}
