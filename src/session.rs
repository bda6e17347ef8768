// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! What a front end reads and drives: a selected month and live projections of
//! the store, each delivered as a `watch` receiver that updates on every write.

use crate::error::{LedgerError, Result};
use crate::ledger::{self, Payment};
use crate::models::{CreditCard, DailyExpense, IncomeEntry, InstallmentPurchase, YearMonth};
use crate::observe::RecordKind;
use crate::store::{self, Store};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug)]
pub struct Session<'a> {
    store: &'a mut Store,
    month: watch::Sender<YearMonth>,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a mut Store, month: YearMonth) -> Self {
        let (month, _) = watch::channel(month);
        Self { store, month }
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut *self.store
    }

    pub fn month(&self) -> YearMonth {
        *self.month.borrow()
    }

    pub fn observe_month(&self) -> watch::Receiver<YearMonth> {
        self.month.subscribe()
    }

    /// Moves the selected month by `months` and re-publishes month-scoped projections.
    /// Fails without changing the selection when the result leaves the calendar.
    pub fn shift_month(&mut self, months: i32) -> Result<YearMonth> {
        let current = self.month();
        let month = current
            .shift(months)
            .ok_or(LedgerError::MonthOutOfRange {
                month: current,
                months,
            })?;
        self.month.send_replace(month);
        debug!("Selected month is now {month}");
        self.store.notify(&[RecordKind::Expense]);
        Ok(month)
    }

    pub fn cards(&mut self) -> Result<watch::Receiver<Vec<CreditCard>>> {
        self.store.observe_cards()
    }

    pub fn incomes(&mut self) -> Result<watch::Receiver<Vec<IncomeEntry>>> {
        self.store.observe_incomes()
    }

    pub fn purchases_for_card(
        &mut self,
        card_id: i64,
    ) -> Result<watch::Receiver<Vec<InstallmentPurchase>>> {
        self.store.observe_purchases_for_card(card_id)
    }

    /// Expenses of the selected month, most recent first.
    pub fn month_expenses(&mut self) -> Result<watch::Receiver<Vec<DailyExpense>>> {
        let month = self.month.subscribe();
        self.store.observe(&[RecordKind::Expense], move |conn| {
            let (start, end) = month.borrow().bounds();
            store::query_expenses(conn, Some((start, end)))
        })
    }

    /// Total income minus the selected month's expenses.
    pub fn balance(&mut self) -> Result<watch::Receiver<Decimal>> {
        let month = self.month.subscribe();
        self.store
            .observe(&[RecordKind::Expense, RecordKind::Income], move |conn| {
                let (start, end) = month.borrow().bounds();
                let income: Decimal = store::query_incomes(conn)?
                    .iter()
                    .map(|i| i.amount)
                    .sum();
                Ok(income - store::sum_expenses_between(conn, start, end)?)
            })
    }

    pub fn pay_month(
        &mut self,
        card_id: i64,
        also_record_expense: bool,
        now: NaiveDateTime,
    ) -> Result<Payment> {
        ledger::pay_month(&mut *self.store, card_id, also_record_expense, now)
    }
}
