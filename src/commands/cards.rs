// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::NewCard;
use crate::settings::parse_switch;
use crate::store::Store;
use crate::utils::{arg, arg_id, fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => {
            let id = arg_id(sub, "id")?;
            let card = store.card(id)?;
            store.delete_card(id)?;
            println!("Removed card {} '{}' and its installment purchases", id, card.bank);
        }
        _ => {}
    }
    Ok(())
}

fn add(store: &mut Store, sub: &clap::ArgMatches) -> Result<()> {
    let card = NewCard {
        bank: arg(sub, "bank")?.trim().to_string(),
        credit_limit: parse_decimal(arg(sub, "limit")?)?,
        closing_day: *sub.get_one::<u32>("closing-day").unwrap_or(&1),
        due_day: *sub.get_one::<u32>("due-day").unwrap_or(&1),
        notify: !sub.get_flag("no-notify"),
    };
    let card = store.insert_card(&card)?;
    println!(
        "Added card {} '{}' (limit {}, closes day {}, due day {})",
        card.id,
        card.bank,
        fmt_money(&card.credit_limit),
        card.closing_day,
        card.due_day
    );
    Ok(())
}

fn list(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let cards = store.cards()?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cards)? {
        let rows = cards
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.bank.clone(),
                    fmt_money(&c.credit_limit),
                    c.closing_day.to_string(),
                    c.due_day.to_string(),
                    if c.notify { "on" } else { "off" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Bank", "Limit", "Closes", "Due", "Alerts"], rows)
        );
    }
    Ok(())
}

fn edit(store: &mut Store, sub: &clap::ArgMatches) -> Result<()> {
    let mut card = store.card(arg_id(sub, "id")?)?;
    if let Some(bank) = sub.get_one::<String>("bank") {
        card.bank = bank.trim().to_string();
    }
    if let Some(limit) = sub.get_one::<String>("limit") {
        card.credit_limit = parse_decimal(limit)?;
    }
    if let Some(day) = sub.get_one::<u32>("closing-day") {
        card.closing_day = *day;
    }
    if let Some(day) = sub.get_one::<u32>("due-day") {
        card.due_day = *day;
    }
    if let Some(notify) = sub.get_one::<String>("notify") {
        card.notify = parse_switch(notify)?;
    }
    store.update_card(&card)?;
    println!("Updated card {} '{}'", card.id, card.bank);
    Ok(())
}
