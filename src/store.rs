// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The persistent store: keyed collections of cards, installment purchases,
//! daily expenses and income entries on top of SQLite.
//!
//! Every write refreshes the observable queries that read the touched record
//! kinds. Free functions taking a `&Connection` are shared with code that runs
//! inside a transaction (see [`crate::ledger::pay_month`]).

use crate::error::{write_failure, LedgerError, Result};
use crate::models::{
    CreditCard, DailyExpense, IncomeEntry, InstallmentPurchase, NewCard, NewExpense, NewIncome,
    NewPurchase,
};
use crate::observe::{RecordKind, Registry};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug)]
pub struct Store {
    conn: Connection,
    registry: Registry,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            registry: Registry::default(),
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Re-broadcasts observable queries after a write made outside the store methods.
    pub(crate) fn notify(&mut self, kinds: &[RecordKind]) {
        self.registry.notify(&self.conn, kinds);
    }

    pub fn observe<T, F>(&mut self, reads: &[RecordKind], query: F) -> Result<watch::Receiver<T>>
    where
        T: Send + Sync + 'static,
        F: FnMut(&Connection) -> Result<T> + Send + 'static,
    {
        self.registry.register(&self.conn, reads, query)
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    // --- cards ---

    pub fn insert_card(&mut self, card: &NewCard) -> Result<CreditCard> {
        self.conn
            .execute(
                "INSERT INTO cards(bank, credit_limit, closing_day, due_day, notify)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    card.bank,
                    card.credit_limit.to_string(),
                    card.closing_day,
                    card.due_day,
                    card.notify
                ],
            )
            .map_err(write_failure("insert card"))?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted card {id} ({})", card.bank);
        self.notify(&[RecordKind::Card]);
        find_card(&self.conn, id)
    }

    pub fn update_card(&mut self, card: &CreditCard) -> Result<()> {
        let n = self
            .conn
            .execute(
                "UPDATE cards SET bank=?1, credit_limit=?2, closing_day=?3, due_day=?4, notify=?5
                 WHERE id=?6",
                params![
                    card.bank,
                    card.credit_limit.to_string(),
                    card.closing_day,
                    card.due_day,
                    card.notify,
                    card.id
                ],
            )
            .map_err(write_failure("update card"))?;
        ensure_touched(n, RecordKind::Card, card.id)?;
        debug!("Updated card {}", card.id);
        self.notify(&[RecordKind::Card]);
        Ok(())
    }

    /// Deletes the card together with all of its installment purchases.
    pub fn delete_card(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM cards WHERE id=?1", params![id])
            .map_err(write_failure("delete card"))?;
        ensure_touched(n, RecordKind::Card, id)?;
        debug!("Deleted card {id}");
        self.notify(&[RecordKind::Card, RecordKind::Purchase]);
        Ok(())
    }

    pub fn card(&self, id: i64) -> Result<CreditCard> {
        find_card(&self.conn, id)
    }

    pub fn cards(&self) -> Result<Vec<CreditCard>> {
        query_cards(&self.conn, false)
    }

    pub fn cards_with_alerts(&self) -> Result<Vec<CreditCard>> {
        query_cards(&self.conn, true)
    }

    pub fn observe_cards(&mut self) -> Result<watch::Receiver<Vec<CreditCard>>> {
        self.observe(&[RecordKind::Card], |conn| query_cards(conn, false))
    }

    // --- installment purchases ---

    pub fn insert_purchase(&mut self, purchase: &NewPurchase) -> Result<InstallmentPurchase> {
        validate_purchase(
            purchase.total_amount,
            purchase.installments,
            purchase.paid_installments,
        )?;
        find_card(&self.conn, purchase.card_id)?;
        self.conn
            .execute(
                "INSERT INTO purchases(card_id, description, total_amount, installments,
                                       purchased_at, paid_installments, responsible)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    purchase.card_id,
                    purchase.description,
                    purchase.total_amount.to_string(),
                    purchase.installments,
                    purchase.purchased_at,
                    purchase.paid_installments,
                    purchase.responsible
                ],
            )
            .map_err(write_failure("insert purchase"))?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted purchase {id} on card {}", purchase.card_id);
        self.notify(&[RecordKind::Purchase]);
        find_purchase(&self.conn, id)
    }

    pub fn update_purchase(&mut self, purchase: &InstallmentPurchase) -> Result<()> {
        validate_purchase(
            purchase.total_amount,
            purchase.installments,
            purchase.paid_installments,
        )?;
        find_card(&self.conn, purchase.card_id)?;
        let n = self
            .conn
            .execute(
                "UPDATE purchases SET card_id=?1, description=?2, total_amount=?3, installments=?4,
                        purchased_at=?5, paid_installments=?6, responsible=?7
                 WHERE id=?8",
                params![
                    purchase.card_id,
                    purchase.description,
                    purchase.total_amount.to_string(),
                    purchase.installments,
                    purchase.purchased_at,
                    purchase.paid_installments,
                    purchase.responsible,
                    purchase.id
                ],
            )
            .map_err(write_failure("update purchase"))?;
        ensure_touched(n, RecordKind::Purchase, purchase.id)?;
        debug!("Updated purchase {}", purchase.id);
        self.notify(&[RecordKind::Purchase]);
        Ok(())
    }

    pub fn delete_purchase(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM purchases WHERE id=?1", params![id])
            .map_err(write_failure("delete purchase"))?;
        ensure_touched(n, RecordKind::Purchase, id)?;
        debug!("Deleted purchase {id}");
        self.notify(&[RecordKind::Purchase]);
        Ok(())
    }

    pub fn purchase(&self, id: i64) -> Result<InstallmentPurchase> {
        find_purchase(&self.conn, id)
    }

    pub fn purchases_for_card(&self, card_id: i64) -> Result<Vec<InstallmentPurchase>> {
        query_purchases_for_card(&self.conn, card_id)
    }

    pub fn observe_purchases_for_card(
        &mut self,
        card_id: i64,
    ) -> Result<watch::Receiver<Vec<InstallmentPurchase>>> {
        self.observe(&[RecordKind::Purchase], move |conn| {
            query_purchases_for_card(conn, card_id)
        })
    }

    // --- daily expenses ---

    pub fn insert_expense(&mut self, expense: &NewExpense) -> Result<DailyExpense> {
        let id = insert_expense_row(&self.conn, expense)?;
        debug!("Inserted expense {id}");
        self.notify(&[RecordKind::Expense]);
        find_expense(&self.conn, id)
    }

    pub fn update_expense(&mut self, expense: &DailyExpense) -> Result<()> {
        let n = self
            .conn
            .execute(
                "UPDATE expenses SET amount=?1, description=?2, category=?3, spent_at=?4
                 WHERE id=?5",
                params![
                    expense.amount.to_string(),
                    expense.description,
                    expense.category,
                    expense.spent_at,
                    expense.id
                ],
            )
            .map_err(write_failure("update expense"))?;
        ensure_touched(n, RecordKind::Expense, expense.id)?;
        debug!("Updated expense {}", expense.id);
        self.notify(&[RecordKind::Expense]);
        Ok(())
    }

    pub fn delete_expense(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM expenses WHERE id=?1", params![id])
            .map_err(write_failure("delete expense"))?;
        ensure_touched(n, RecordKind::Expense, id)?;
        debug!("Deleted expense {id}");
        self.notify(&[RecordKind::Expense]);
        Ok(())
    }

    pub fn expense(&self, id: i64) -> Result<DailyExpense> {
        find_expense(&self.conn, id)
    }

    /// All expenses, most recent first.
    pub fn expenses(&self) -> Result<Vec<DailyExpense>> {
        query_expenses(&self.conn, None)
    }

    /// Expenses with `start <= spent_at <= end`, most recent first.
    pub fn expenses_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<DailyExpense>> {
        query_expenses(&self.conn, Some((start, end)))
    }

    pub fn expense_total_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Decimal> {
        sum_expenses_between(&self.conn, start, end)
    }

    pub fn observe_expenses(&mut self) -> Result<watch::Receiver<Vec<DailyExpense>>> {
        self.observe(&[RecordKind::Expense], |conn| query_expenses(conn, None))
    }

    // --- income ---

    pub fn insert_income(&mut self, income: &NewIncome) -> Result<IncomeEntry> {
        self.conn
            .execute(
                "INSERT INTO incomes(amount, source, frequency, registered_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    income.amount.to_string(),
                    income.source,
                    income.frequency.as_str(),
                    income.registered_at
                ],
            )
            .map_err(write_failure("insert income"))?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted income {id} ({})", income.source);
        self.notify(&[RecordKind::Income]);
        find_income(&self.conn, id)
    }

    pub fn update_income(&mut self, income: &IncomeEntry) -> Result<()> {
        let n = self
            .conn
            .execute(
                "UPDATE incomes SET amount=?1, source=?2, frequency=?3, registered_at=?4
                 WHERE id=?5",
                params![
                    income.amount.to_string(),
                    income.source,
                    income.frequency.as_str(),
                    income.registered_at,
                    income.id
                ],
            )
            .map_err(write_failure("update income"))?;
        ensure_touched(n, RecordKind::Income, income.id)?;
        debug!("Updated income {}", income.id);
        self.notify(&[RecordKind::Income]);
        Ok(())
    }

    pub fn delete_income(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM incomes WHERE id=?1", params![id])
            .map_err(write_failure("delete income"))?;
        ensure_touched(n, RecordKind::Income, id)?;
        debug!("Deleted income {id}");
        self.notify(&[RecordKind::Income]);
        Ok(())
    }

    pub fn income(&self, id: i64) -> Result<IncomeEntry> {
        find_income(&self.conn, id)
    }

    /// All income entries, most recently registered first.
    pub fn incomes(&self) -> Result<Vec<IncomeEntry>> {
        query_incomes(&self.conn)
    }

    pub fn observe_incomes(&mut self) -> Result<watch::Receiver<Vec<IncomeEntry>>> {
        self.observe(&[RecordKind::Income], query_incomes)
    }

    // --- settings ---

    pub fn setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key=?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO settings(key, value) VALUES(?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value",
                params![key, value],
            )
            .map_err(write_failure("write setting"))?;
        Ok(())
    }
}

/// Rejects purchases that would break the amortization math.
pub fn validate_purchase(total_amount: Decimal, installments: u32, paid: u32) -> Result<()> {
    if installments < 1 {
        return Err(LedgerError::InvalidPurchase(
            "installment count must be at least 1".into(),
        ));
    }
    if paid > installments {
        return Err(LedgerError::InvalidPurchase(format!(
            "{paid} installments paid out of {installments}"
        )));
    }
    if total_amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidPurchase(format!(
            "total amount must be positive, got {total_amount}"
        )));
    }
    Ok(())
}

fn ensure_touched(rows: usize, kind: RecordKind, id: i64) -> Result<()> {
    if rows == 0 {
        return Err(LedgerError::NotFound { kind, id });
    }
    Ok(())
}

fn decimal_at(r: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn card_from_row(r: &Row) -> rusqlite::Result<CreditCard> {
    Ok(CreditCard {
        id: r.get(0)?,
        bank: r.get(1)?,
        credit_limit: decimal_at(r, 2)?,
        closing_day: r.get(3)?,
        due_day: r.get(4)?,
        notify: r.get(5)?,
    })
}

fn purchase_from_row(r: &Row) -> rusqlite::Result<InstallmentPurchase> {
    Ok(InstallmentPurchase {
        id: r.get(0)?,
        card_id: r.get(1)?,
        description: r.get(2)?,
        total_amount: decimal_at(r, 3)?,
        installments: r.get(4)?,
        purchased_at: r.get(5)?,
        paid_installments: r.get(6)?,
        responsible: r.get(7)?,
    })
}

fn expense_from_row(r: &Row) -> rusqlite::Result<DailyExpense> {
    Ok(DailyExpense {
        id: r.get(0)?,
        amount: decimal_at(r, 1)?,
        description: r.get(2)?,
        category: r.get(3)?,
        spent_at: r.get(4)?,
    })
}

fn income_from_row(r: &Row) -> rusqlite::Result<IncomeEntry> {
    let frequency: String = r.get(3)?;
    Ok(IncomeEntry {
        id: r.get(0)?,
        amount: decimal_at(r, 1)?,
        source: r.get(2)?,
        frequency: frequency
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        registered_at: r.get(4)?,
    })
}

const CARD_COLUMNS: &str = "id, bank, credit_limit, closing_day, due_day, notify";
const PURCHASE_COLUMNS: &str = "id, card_id, description, total_amount, installments, \
                                purchased_at, paid_installments, responsible";
const EXPENSE_COLUMNS: &str = "id, amount, description, category, spent_at";
const INCOME_COLUMNS: &str = "id, amount, source, frequency, registered_at";

pub(crate) fn find_card(conn: &Connection, id: i64) -> Result<CreditCard> {
    conn.query_row(
        &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id=?1"),
        params![id],
        card_from_row,
    )
    .optional()?
    .ok_or(LedgerError::NotFound {
        kind: RecordKind::Card,
        id,
    })
}

fn query_cards(conn: &Connection, alerts_only: bool) -> Result<Vec<CreditCard>> {
    let filter = if alerts_only { "WHERE notify=1" } else { "" };
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS} FROM cards {filter} ORDER BY id"
    ))?;
    let rows = stmt.query_map([], card_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn find_purchase(conn: &Connection, id: i64) -> Result<InstallmentPurchase> {
    conn.query_row(
        &format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id=?1"),
        params![id],
        purchase_from_row,
    )
    .optional()?
    .ok_or(LedgerError::NotFound {
        kind: RecordKind::Purchase,
        id,
    })
}

pub(crate) fn query_purchases_for_card(
    conn: &Connection,
    card_id: i64,
) -> Result<Vec<InstallmentPurchase>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE card_id=?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![card_id], purchase_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn insert_expense_row(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses(amount, description, category, spent_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            expense.amount.to_string(),
            expense.description,
            expense.category,
            expense.spent_at
        ],
    )
    .map_err(write_failure("insert expense"))?;
    Ok(conn.last_insert_rowid())
}

fn find_expense(conn: &Connection, id: i64) -> Result<DailyExpense> {
    conn.query_row(
        &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id=?1"),
        params![id],
        expense_from_row,
    )
    .optional()?
    .ok_or(LedgerError::NotFound {
        kind: RecordKind::Expense,
        id,
    })
}

pub(crate) fn query_expenses(
    conn: &Connection,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
) -> Result<Vec<DailyExpense>> {
    let rows = match range {
        Some((start, end)) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE spent_at BETWEEN ?1 AND ?2
                 ORDER BY spent_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map(params![start, end], expense_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY spent_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([], expense_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Sums in `Decimal` rather than with SQL `SUM`, which would go through floats.
pub(crate) fn sum_expenses_between(
    conn: &Connection,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Decimal> {
    let mut stmt = conn.prepare("SELECT amount FROM expenses WHERE spent_at BETWEEN ?1 AND ?2")?;
    let mut rows = stmt.query(params![start, end])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        total += decimal_at(r, 0)?;
    }
    Ok(total)
}

fn find_income(conn: &Connection, id: i64) -> Result<IncomeEntry> {
    conn.query_row(
        &format!("SELECT {INCOME_COLUMNS} FROM incomes WHERE id=?1"),
        params![id],
        income_from_row,
    )
    .optional()?
    .ok_or(LedgerError::NotFound {
        kind: RecordKind::Income,
        id,
    })
}

pub(crate) fn query_incomes(conn: &Connection) -> Result<Vec<IncomeEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INCOME_COLUMNS} FROM incomes ORDER BY registered_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], income_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
