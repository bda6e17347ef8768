// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Frequency, NewIncome};
use crate::store::Store;
use crate::utils::{
    arg, arg_id, fmt_money, fmt_timestamp, maybe_print_json, parse_date, parse_decimal,
    pretty_table, timestamp_on,
};
use anyhow::Result;

pub fn handle(store: &mut Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let date = sub
                .get_one::<String>("date")
                .map(|d| parse_date(d))
                .transpose()?;
            let income = store.insert_income(&NewIncome {
                amount: parse_decimal(arg(sub, "amount")?)?,
                source: arg(sub, "source")?.trim().to_string(),
                frequency: arg(sub, "frequency")?.parse::<Frequency>()?,
                registered_at: timestamp_on(date),
            })?;
            println!(
                "Added {} income '{}' of {}",
                income.frequency,
                income.source,
                fmt_money(&income.amount)
            );
        }
        Some(("list", sub)) => {
            let data = store.incomes()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|i| {
                        vec![
                            i.id.to_string(),
                            i.source.clone(),
                            i.frequency.to_string(),
                            fmt_money(&i.amount),
                            fmt_timestamp(&i.registered_at),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Source", "Frequency", "Amount", "Registered"], rows)
                );
            }
        }
        Some(("edit", sub)) => {
            let mut income = store.income(arg_id(sub, "id")?)?;
            if let Some(amount) = sub.get_one::<String>("amount") {
                income.amount = parse_decimal(amount)?;
            }
            if let Some(source) = sub.get_one::<String>("source") {
                income.source = source.trim().to_string();
            }
            if let Some(frequency) = sub.get_one::<String>("frequency") {
                income.frequency = frequency.parse()?;
            }
            store.update_income(&income)?;
            println!("Updated income {}", income.id);
        }
        Some(("rm", sub)) => {
            let id = arg_id(sub, "id")?;
            store.delete_income(id)?;
            println!("Removed income {}", id);
        }
        _ => {}
    }
    Ok(())
}
