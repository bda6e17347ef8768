// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cardclip::db;
use cardclip::ledger::{pay_month, preview_payment, PAYMENT_CATEGORY};
use cardclip::models::{NewCard, NewPurchase};
use cardclip::observe::RecordKind;
use cardclip::{LedgerError, Store};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 10)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap()
}

/// A card holding a 600/6 purchase with two paid and a 300/3 purchase owed by Mom.
fn setup() -> (Store, i64, i64, i64) {
    let mut store = db::open_in_memory().unwrap();
    let card = store
        .insert_card(&NewCard {
            bank: "Banorte".into(),
            credit_limit: Decimal::from(30000),
            closing_day: 15,
            due_day: 5,
            notify: true,
        })
        .unwrap()
        .id;
    let bought = NaiveDate::from_ymd_opt(2025, 1, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let mut mine = NewPurchase::new(card, "Fridge", Decimal::from(600), 6, bought, "");
    mine.paid_installments = 2;
    let mine = store.insert_purchase(&mine).unwrap().id;
    let moms = store
        .insert_purchase(&NewPurchase::new(
            card,
            "Blender",
            Decimal::from(300),
            3,
            bought,
            "Mom",
        ))
        .unwrap()
        .id;
    (store, card, mine, moms)
}

#[test]
fn pays_every_open_purchase_and_records_expense() {
    let (mut store, card, mine, moms) = setup();
    let payment = pay_month(&mut store, card, true, now()).unwrap();

    assert_eq!(payment.total_paid, Decimal::from(200));
    assert_eq!(payment.advanced, vec![mine, moms]);
    assert_eq!(store.purchase(mine).unwrap().paid_installments, 3);
    assert_eq!(store.purchase(moms).unwrap().paid_installments, 1);

    let expenses = store.expenses().unwrap();
    assert_eq!(expenses.len(), 1);
    let e = &expenses[0];
    assert_eq!(Some(e.id), payment.expense_id);
    assert_eq!(e.amount, Decimal::from(200));
    assert_eq!(e.description, "Card payment: Banorte");
    assert_eq!(e.category, PAYMENT_CATEGORY);
    assert_eq!(e.spent_at, now());
}

#[test]
fn without_expense_only_advances() {
    let (mut store, card, mine, _) = setup();
    let payment = pay_month(&mut store, card, false, now()).unwrap();
    assert_eq!(payment.total_paid, Decimal::from(200));
    assert_eq!(payment.expense_id, None);
    assert!(store.expenses().unwrap().is_empty());
    assert_eq!(store.purchase(mine).unwrap().paid_installments, 3);
}

#[test]
fn completed_purchases_are_skipped() {
    let (mut store, card, mine, moms) = setup();
    for _ in 0..3 {
        pay_month(&mut store, card, false, now()).unwrap();
    }
    // Mom's blender is done, the fridge has one left
    assert_eq!(store.purchase(moms).unwrap().paid_installments, 3);
    assert_eq!(store.purchase(mine).unwrap().paid_installments, 5);

    let payment = pay_month(&mut store, card, true, now()).unwrap();
    assert_eq!(payment.total_paid, Decimal::from(100));
    assert_eq!(payment.advanced, vec![mine]);
    assert_eq!(store.purchase(moms).unwrap().paid_installments, 3);
}

#[test]
fn paying_a_settled_card_is_a_no_op() {
    let (mut store, card, mine, moms) = setup();
    for _ in 0..4 {
        pay_month(&mut store, card, false, now()).unwrap();
    }
    for _ in 0..2 {
        let payment = pay_month(&mut store, card, true, now()).unwrap();
        assert_eq!(payment.total_paid, Decimal::ZERO);
        assert!(payment.advanced.is_empty());
        assert_eq!(payment.expense_id, None);
    }
    assert!(store.expenses().unwrap().is_empty());
    assert_eq!(store.purchase(mine).unwrap().paid_installments, 6);
    assert_eq!(store.purchase(moms).unwrap().paid_installments, 3);
}

#[test]
fn unknown_card_is_not_found() {
    let (mut store, _, _, _) = setup();
    let err = pay_month(&mut store, 404, true, now()).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::NotFound {
            kind: RecordKind::Card,
            id: 404
        }
    ));
    assert!(store.expenses().unwrap().is_empty());
}

#[test]
fn failed_expense_insert_rolls_back_installments() {
    let (mut store, card, mine, moms) = setup();
    store
        .conn()
        .execute_batch(
            "CREATE TRIGGER refuse_expenses BEFORE INSERT ON expenses
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();

    let err = pay_month(&mut store, card, true, now()).unwrap_err();
    assert!(matches!(err, LedgerError::StoreWriteFailure { .. }));
    assert_eq!(store.purchase(mine).unwrap().paid_installments, 2);
    assert_eq!(store.purchase(moms).unwrap().paid_installments, 0);

    // The store is still usable afterwards
    let payment = pay_month(&mut store, card, false, now()).unwrap();
    assert_eq!(payment.total_paid, Decimal::from(200));
}

#[test]
fn skipped_installment_update_aborts_the_payment() {
    let (mut store, card, mine, moms) = setup();
    // Silently drops the update to Mom's purchase, as if another writer got there first
    store
        .conn()
        .execute_batch(&format!(
            "CREATE TRIGGER lose_update BEFORE UPDATE ON purchases
             WHEN OLD.id = {moms}
             BEGIN SELECT RAISE(IGNORE); END;"
        ))
        .unwrap();

    let err = pay_month(&mut store, card, true, now()).unwrap_err();
    match err {
        LedgerError::StoreWriteFailure { operation, source } => {
            assert_eq!(operation, "advance installment");
            assert!(matches!(source, rusqlite::Error::StatementChangedRows(0)));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(store.purchase(mine).unwrap().paid_installments, 2);
    assert_eq!(store.purchase(moms).unwrap().paid_installments, 0);
    assert!(store.expenses().unwrap().is_empty());
}

#[test]
fn preview_matches_payment() {
    let (mut store, card, mine, _) = setup();
    let preview = preview_payment(&store, card).unwrap();
    assert_eq!(store.purchase(mine).unwrap().paid_installments, 2);
    let payment = pay_month(&mut store, card, false, now()).unwrap();
    assert_eq!(preview, payment.total_paid);
}

#[test]
fn payment_refreshes_observers() {
    let (mut store, card, _, _) = setup();
    let mut purchases = store.observe_purchases_for_card(card).unwrap();
    let mut expenses = store.observe_expenses().unwrap();
    purchases.mark_unchanged();
    expenses.mark_unchanged();

    pay_month(&mut store, card, true, now()).unwrap();

    assert!(purchases.has_changed().unwrap());
    assert!(purchases
        .borrow_and_update()
        .iter()
        .all(|p| p.paid_installments >= 1));
    assert!(expenses.has_changed().unwrap());
    assert_eq!(expenses.borrow_and_update().len(), 1);
}
