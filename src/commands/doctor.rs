// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::Store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Rows that break a ledger invariant, as `(issue, detail)` pairs.
pub fn find_issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Installment counts
    let mut stmt = conn.prepare(
        "SELECT id, installments, paid_installments FROM purchases
         WHERE installments < 1 OR paid_installments < 0 OR paid_installments > installments
         ORDER BY id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let total: i64 = r.get(1)?;
        let paid: i64 = r.get(2)?;
        rows.push(vec![
            "bad_installments".into(),
            format!("purchase {} has {}/{} paid", id, paid, total),
        ]);
    }

    // 2) Amounts that do not parse or are not positive
    let mut stmt2 = conn.prepare("SELECT id, total_amount FROM purchases ORDER BY id")?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let amount: String = r.get(1)?;
        match amount.trim().parse::<rust_decimal::Decimal>() {
            Ok(d) if d > rust_decimal::Decimal::ZERO => {}
            _ => rows.push(vec![
                "bad_amount".into(),
                format!("purchase {} has total '{}'", id, amount),
            ]),
        }
    }

    // 3) Day-of-month fields
    let mut stmt3 = conn.prepare(
        "SELECT id, closing_day, due_day FROM cards
         WHERE closing_day NOT BETWEEN 1 AND 31 OR due_day NOT BETWEEN 1 AND 31
         ORDER BY id",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let id: i64 = r.get(0)?;
        let closing: i64 = r.get(1)?;
        let due: i64 = r.get(2)?;
        rows.push(vec![
            "bad_day".into(),
            format!("card {} closes day {}, due day {}", id, closing, due),
        ]);
    }

    // 4) Purchases whose card is gone
    let mut stmt4 = conn.prepare(
        "SELECT p.id, p.card_id FROM purchases p LEFT JOIN cards c ON p.card_id=c.id
         WHERE c.id IS NULL ORDER BY p.id",
    )?;
    let mut cur4 = stmt4.query([])?;
    while let Some(r) = cur4.next()? {
        let id: i64 = r.get(0)?;
        let card: i64 = r.get(1)?;
        rows.push(vec![
            "orphan_purchase".into(),
            format!("purchase {} points at missing card {}", id, card),
        ]);
    }

    Ok(rows)
}

pub fn handle(store: &Store) -> Result<()> {
    let rows = find_issues(store.conn())?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
