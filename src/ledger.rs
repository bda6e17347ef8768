// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Installment accounting: amortization figures, the monthly obligation of a
//! card split between the holder and third-party debtors, and the "pay this
//! month" transition.

use crate::error::{write_failure, LedgerError, Result};
use crate::models::{InstallmentPurchase, NewExpense, YearMonth};
use crate::observe::RecordKind;
use crate::store::{self, Store};
use chrono::NaiveDateTime;
use rusqlite::params;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Category given to the expense recorded by [`pay_month`].
pub const PAYMENT_CATEGORY: &str = "Debt / Credit";

/// Closing alerts fire when the statement closes within this many days.
pub const CLOSING_ALERT_WINDOW: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Amortization {
    pub monthly_amount: Decimal,
    pub remaining_balance: Decimal,
    pub remaining_count: u32,
}

pub fn derive(purchase: &InstallmentPurchase) -> Result<Amortization> {
    if purchase.installments == 0 {
        return Err(LedgerError::InvalidPurchase(format!(
            "purchase {} has zero installments",
            purchase.id
        )));
    }
    let remaining_count = purchase
        .installments
        .checked_sub(purchase.paid_installments)
        .ok_or_else(|| {
            LedgerError::InvalidPurchase(format!(
                "purchase {} has {} of {} installments paid",
                purchase.id, purchase.paid_installments, purchase.installments
            ))
        })?;
    let monthly_amount = purchase.total_amount / Decimal::from(purchase.installments);
    Ok(Amortization {
        monthly_amount,
        remaining_balance: purchase.total_amount
            - monthly_amount * Decimal::from(purchase.paid_installments),
        remaining_count,
    })
}

/// Which purchases count towards a card's monthly obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObligationPolicy {
    /// Only purchases with installments left, matching what [`pay_month`] charges.
    #[default]
    OpenOnly,
    /// Every purchase on the card, fully paid ones included.
    IncludeCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Obligation {
    pub total_due: Decimal,
    pub self_due: Decimal,
    pub per_debtor_due: BTreeMap<String, Decimal>,
}

impl Obligation {
    pub fn owed_by_others(&self) -> Decimal {
        self.per_debtor_due.values().copied().sum()
    }
}

pub fn aggregate_monthly_obligation(purchases: &[InstallmentPurchase]) -> Result<Obligation> {
    aggregate_with(purchases, ObligationPolicy::default())
}

pub fn aggregate_with(
    purchases: &[InstallmentPurchase],
    policy: ObligationPolicy,
) -> Result<Obligation> {
    let mut out = Obligation::default();
    for p in purchases {
        let figures = derive(p)?;
        if figures.remaining_count == 0 && policy == ObligationPolicy::OpenOnly {
            continue;
        }
        out.total_due += figures.monthly_amount;
        if p.is_self() {
            out.self_due += figures.monthly_amount;
        } else {
            *out
                .per_debtor_due
                .entry(p.responsible.clone())
                .or_insert(Decimal::ZERO) += figures.monthly_amount;
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub card_id: i64,
    pub total_paid: Decimal,
    pub advanced: Vec<i64>,
    pub expense_id: Option<i64>,
}

/// Advances every open purchase on the card by one installment.
///
/// All updates and the optional expense insert run in a single transaction:
/// either every eligible purchase moves forward (and the expense is recorded)
/// or nothing changes. Fully paid purchases are left untouched and contribute
/// nothing to `total_paid`.
pub fn pay_month(
    store: &mut Store,
    card_id: i64,
    also_record_expense: bool,
    now: NaiveDateTime,
) -> Result<Payment> {
    let payment = {
        let tx = store
            .conn_mut()
            .transaction()
            .map_err(write_failure("begin payment"))?;
        let card = store::find_card(&tx, card_id)?;
        let mut total_paid = Decimal::ZERO;
        let mut advanced = Vec::new();
        for p in store::query_purchases_for_card(&tx, card_id)? {
            let figures = derive(&p)?;
            if figures.remaining_count == 0 {
                continue;
            }
            let n = tx
                .execute(
                    "UPDATE purchases SET paid_installments=?1 WHERE id=?2 AND paid_installments=?3",
                    params![p.paid_installments + 1, p.id, p.paid_installments],
                )
                .map_err(write_failure("advance installment"))?;
            if n != 1 {
                return Err(LedgerError::StoreWriteFailure {
                    operation: "advance installment",
                    source: rusqlite::Error::StatementChangedRows(n),
                });
            }
            debug!(
                "Purchase {} now at {}/{}",
                p.id,
                p.paid_installments + 1,
                p.installments
            );
            total_paid += figures.monthly_amount;
            advanced.push(p.id);
        }

        let expense_id = if also_record_expense && total_paid > Decimal::ZERO {
            Some(store::insert_expense_row(
                &tx,
                &NewExpense {
                    amount: total_paid,
                    description: format!("Card payment: {}", card.bank),
                    category: PAYMENT_CATEGORY.to_string(),
                    spent_at: now,
                },
            )?)
        } else {
            None
        };

        tx.commit().map_err(write_failure("commit payment"))?;
        Payment {
            card_id,
            total_paid,
            advanced,
            expense_id,
        }
    };

    info!(
        "Paid {} on card {} across {} purchase(s)",
        payment.total_paid,
        card_id,
        payment.advanced.len()
    );
    store.notify(&[RecordKind::Purchase, RecordKind::Expense]);
    Ok(payment)
}

/// The amount [`pay_month`] would charge right now, without changing anything.
pub fn preview_payment(store: &Store, card_id: i64) -> Result<Decimal> {
    store.card(card_id)?;
    let purchases = store.purchases_for_card(card_id)?;
    Ok(aggregate_with(&purchases, ObligationPolicy::OpenOnly)?.total_due)
}

/// Sum of all expenses dated within the calendar month, both ends inclusive.
pub fn monthly_expense_total(store: &Store, year: i32, month: u32) -> Result<Decimal> {
    let ym = YearMonth::new(year, month).ok_or(LedgerError::InvalidMonth { year, month })?;
    let (start, end) = ym.bounds();
    store.expense_total_between(start, end)
}

/// Days left until the statement closes, when that falls within the alert window.
///
/// Plain day-of-month subtraction: a closing day early next month is not seen
/// from the end of the current one.
pub fn closing_alert_days(closing_day: u32, today_day: u32) -> Option<u32> {
    let diff = i64::from(closing_day) - i64::from(today_day);
    (0..=i64::from(CLOSING_ALERT_WINDOW))
        .contains(&diff)
        .then_some(diff as u32)
}

pub fn completion_alert_due(remaining_count: u32) -> bool {
    (1..=2).contains(&remaining_count)
}
