// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cardclip::db;
use cardclip::ledger::monthly_expense_total;
use cardclip::models::{Frequency, NewCard, NewExpense, NewIncome, NewPurchase, SELF_PARTY};
use cardclip::observe::RecordKind;
use cardclip::{LedgerError, Store};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn setup() -> Store {
    db::open_in_memory().unwrap()
}

fn add_card(store: &mut Store, bank: &str) -> i64 {
    store
        .insert_card(&NewCard {
            bank: bank.to_string(),
            credit_limit: Decimal::from(20000),
            closing_day: 15,
            due_day: 5,
            notify: true,
        })
        .unwrap()
        .id
}

fn add_expense(store: &mut Store, amount: i64, spent_at: NaiveDateTime) -> i64 {
    store
        .insert_expense(&NewExpense {
            amount: Decimal::from(amount),
            description: "Groceries".into(),
            category: "Food".into(),
            spent_at,
        })
        .unwrap()
        .id
}

#[test]
fn card_roundtrip_keeps_decimal_limit() {
    let mut store = setup();
    let card = store
        .insert_card(&NewCard {
            bank: "BBVA".into(),
            credit_limit: "15000.50".parse().unwrap(),
            closing_day: 20,
            due_day: 10,
            notify: false,
        })
        .unwrap();
    let loaded = store.card(card.id).unwrap();
    assert_eq!(loaded, card);
    assert_eq!(loaded.credit_limit, "15000.50".parse::<Decimal>().unwrap());
    assert!(store.cards_with_alerts().unwrap().is_empty());
}

#[test]
fn blank_debtor_means_self() {
    let mut store = setup();
    let card = add_card(&mut store, "Nu");
    let p = store
        .insert_purchase(&NewPurchase::new(
            card,
            "Laptop",
            Decimal::from(1200),
            12,
            at(2025, 3, 1, 10, 0, 0),
            "  ",
        ))
        .unwrap();
    assert_eq!(p.responsible, SELF_PARTY);
    assert!(p.is_self());
    assert_eq!(p.paid_installments, 0);
}

#[test]
fn purchase_validation() {
    let mut store = setup();
    let card = add_card(&mut store, "Nu");
    let when = at(2025, 3, 1, 10, 0, 0);

    let zero = NewPurchase::new(card, "Zero", Decimal::from(100), 0, when, "");
    assert!(matches!(
        store.insert_purchase(&zero),
        Err(LedgerError::InvalidPurchase(_))
    ));

    let free = NewPurchase::new(card, "Free", Decimal::ZERO, 3, when, "");
    assert!(matches!(
        store.insert_purchase(&free),
        Err(LedgerError::InvalidPurchase(_))
    ));

    let mut overpaid = NewPurchase::new(card, "Over", Decimal::from(100), 2, when, "");
    overpaid.paid_installments = 3;
    assert!(matches!(
        store.insert_purchase(&overpaid),
        Err(LedgerError::InvalidPurchase(_))
    ));

    let orphan = NewPurchase::new(99, "Orphan", Decimal::from(100), 2, when, "");
    assert!(matches!(
        store.insert_purchase(&orphan),
        Err(LedgerError::NotFound {
            kind: RecordKind::Card,
            id: 99
        })
    ));
    assert!(store.purchases_for_card(card).unwrap().is_empty());
}

#[test]
fn deleting_a_card_removes_its_purchases() {
    let mut store = setup();
    let keep = add_card(&mut store, "Keep");
    let gone = add_card(&mut store, "Gone");
    let when = at(2025, 3, 1, 10, 0, 0);
    store
        .insert_purchase(&NewPurchase::new(keep, "TV", Decimal::from(600), 6, when, ""))
        .unwrap();
    let doomed = store
        .insert_purchase(&NewPurchase::new(gone, "Phone", Decimal::from(300), 3, when, ""))
        .unwrap();

    store.delete_card(gone).unwrap();
    assert!(matches!(
        store.purchase(doomed.id),
        Err(LedgerError::NotFound {
            kind: RecordKind::Purchase,
            ..
        })
    ));
    assert_eq!(store.purchases_for_card(keep).unwrap().len(), 1);
    assert_eq!(store.cards().unwrap().len(), 1);
}

#[test]
fn missing_rows_are_not_found() {
    let mut store = setup();
    assert!(matches!(
        store.delete_card(5),
        Err(LedgerError::NotFound {
            kind: RecordKind::Card,
            id: 5
        })
    ));
    assert!(matches!(
        store.delete_expense(8),
        Err(LedgerError::NotFound {
            kind: RecordKind::Expense,
            id: 8
        })
    ));
    assert!(matches!(
        store.delete_income(3),
        Err(LedgerError::NotFound {
            kind: RecordKind::Income,
            id: 3
        })
    ));

    let id = add_expense(&mut store, 10, at(2025, 1, 1, 9, 0, 0));
    let mut ghost = store.expense(id).unwrap();
    ghost.id = 42;
    assert!(matches!(
        store.update_expense(&ghost),
        Err(LedgerError::NotFound { .. })
    ));
}

#[test]
fn expenses_list_most_recent_first() {
    let mut store = setup();
    let a = add_expense(&mut store, 10, at(2025, 1, 5, 9, 0, 0));
    let b = add_expense(&mut store, 20, at(2025, 1, 7, 9, 0, 0));
    let c = add_expense(&mut store, 30, at(2025, 1, 6, 9, 0, 0));
    let ids: Vec<i64> = store.expenses().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![b, c, a]);
}

#[test]
fn leap_february_total_is_inclusive() {
    let mut store = setup();
    add_expense(&mut store, 5, at(2024, 1, 31, 23, 59, 59));
    add_expense(&mut store, 10, at(2024, 2, 1, 0, 0, 0));
    add_expense(&mut store, 20, at(2024, 2, 29, 23, 59, 59));
    add_expense(&mut store, 40, at(2024, 3, 1, 0, 0, 0));

    assert_eq!(
        monthly_expense_total(&store, 2024, 2).unwrap(),
        Decimal::from(30)
    );
    assert_eq!(
        monthly_expense_total(&store, 2024, 3).unwrap(),
        Decimal::from(40)
    );
    assert_eq!(
        monthly_expense_total(&store, 2023, 2).unwrap(),
        Decimal::ZERO
    );
}

#[test]
fn invalid_month_is_rejected() {
    let store = setup();
    assert!(matches!(
        monthly_expense_total(&store, 2024, 13),
        Err(LedgerError::InvalidMonth {
            year: 2024,
            month: 13
        })
    ));
}

#[test]
fn expense_totals_stay_exact() {
    let mut store = setup();
    for _ in 0..10 {
        store
            .insert_expense(&NewExpense {
                amount: "0.10".parse().unwrap(),
                description: "Gum".into(),
                category: "Snacks".into(),
                spent_at: at(2025, 6, 2, 8, 0, 0),
            })
            .unwrap();
    }
    assert_eq!(
        monthly_expense_total(&store, 2025, 6).unwrap(),
        Decimal::ONE
    );
}

#[test]
fn income_roundtrip() {
    let mut store = setup();
    let older = store
        .insert_income(&NewIncome {
            amount: Decimal::from(5000),
            source: "Salary".into(),
            frequency: Frequency::Biweekly,
            registered_at: at(2025, 1, 1, 9, 0, 0),
        })
        .unwrap();
    let newer = store
        .insert_income(&NewIncome {
            amount: Decimal::from(800),
            source: "Freelance".into(),
            frequency: Frequency::Monthly,
            registered_at: at(2025, 2, 1, 9, 0, 0),
        })
        .unwrap();
    let all = store.incomes().unwrap();
    assert_eq!(all[0].id, newer.id);
    assert_eq!(all[1], older);

    let mut changed = older.clone();
    changed.frequency = Frequency::Weekly;
    store.update_income(&changed).unwrap();
    assert_eq!(store.income(older.id).unwrap().frequency, Frequency::Weekly);
}

#[test]
fn settings_upsert() {
    let store = setup();
    assert_eq!(store.setting("notifications").unwrap(), None);
    store.set_setting("notifications", "off").unwrap();
    store.set_setting("notifications", "on").unwrap();
    assert_eq!(store.setting("notifications").unwrap().as_deref(), Some("on"));
}
