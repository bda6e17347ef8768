// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cardclip::commands::dashboard;
use cardclip::db;
use cardclip::models::{Frequency, NewCard, NewExpense, NewIncome, YearMonth};
use cardclip::observe::RecordKind;
use cardclip::session::Session;
use cardclip::{LedgerError, Store};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn expense(amount: i64, spent_at: NaiveDateTime) -> NewExpense {
    NewExpense {
        amount: Decimal::from(amount),
        description: "Lunch".into(),
        category: "Food".into(),
        spent_at,
    }
}

/// 1000 of income, 100 spent in January 2025 and 250 in February.
fn setup() -> Store {
    let mut store = db::open_in_memory().unwrap();
    store
        .insert_income(&NewIncome {
            amount: Decimal::from(1000),
            source: "Salary".into(),
            frequency: Frequency::Monthly,
            registered_at: at(2024, 12, 30),
        })
        .unwrap();
    store.insert_expense(&expense(100, at(2025, 1, 15))).unwrap();
    store.insert_expense(&expense(200, at(2025, 2, 1))).unwrap();
    store.insert_expense(&expense(50, at(2025, 2, 28))).unwrap();
    store
}

#[test]
fn observer_sees_new_rows() {
    let mut store = db::open_in_memory().unwrap();
    let mut cards = store.observe_cards().unwrap();
    assert!(cards.borrow().is_empty());
    assert!(!cards.has_changed().unwrap());

    store
        .insert_card(&NewCard {
            bank: "HSBC".into(),
            credit_limit: Decimal::from(5000),
            closing_day: 3,
            due_day: 23,
            notify: true,
        })
        .unwrap();
    assert!(cards.has_changed().unwrap());
    assert_eq!(cards.borrow_and_update()[0].bank, "HSBC");
}

#[test]
fn unrelated_writes_leave_observers_alone() {
    let mut store = setup();
    let mut cards = store.observe_cards().unwrap();
    store.insert_expense(&expense(1, at(2025, 3, 1))).unwrap();
    assert!(!cards.has_changed().unwrap());
}

#[test]
fn dropped_observers_are_pruned() {
    let mut store = setup();
    let incomes = store.observe_incomes().unwrap();
    let _expenses = store.observe_expenses().unwrap();
    assert_eq!(store.subscription_count(), 2);

    drop(incomes);
    store
        .insert_income(&NewIncome {
            amount: Decimal::from(10),
            source: "Gift".into(),
            frequency: Frequency::Weekly,
            registered_at: at(2025, 1, 2),
        })
        .unwrap();
    assert_eq!(store.subscription_count(), 1);
}

#[test]
fn custom_queries_can_be_observed() {
    let mut store = setup();
    let mut count = store
        .observe(&[RecordKind::Expense], |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get::<_, i64>(0))?)
        })
        .unwrap();
    assert_eq!(*count.borrow(), 3);
    store.insert_expense(&expense(5, at(2025, 3, 3))).unwrap();
    assert_eq!(*count.borrow_and_update(), 4);
}

#[test]
fn balance_follows_selected_month() {
    let mut store = setup();
    let mut session = Session::new(&mut store, YearMonth::new(2025, 1).unwrap());
    let mut balance = session.balance().unwrap();
    let mut month_expenses = session.month_expenses().unwrap();
    assert_eq!(*balance.borrow(), Decimal::from(900));
    assert_eq!(month_expenses.borrow().len(), 1);

    assert_eq!(session.shift_month(1).unwrap(), YearMonth::new(2025, 2).unwrap());
    assert!(balance.has_changed().unwrap());
    assert_eq!(*balance.borrow_and_update(), Decimal::from(750));
    assert_eq!(month_expenses.borrow_and_update().len(), 2);

    session.shift_month(-2).unwrap();
    assert_eq!(session.month(), YearMonth::new(2024, 12).unwrap());
    assert_eq!(*balance.borrow_and_update(), Decimal::from(1000));
    assert!(month_expenses.borrow_and_update().is_empty());
}

#[test]
fn balance_tracks_writes_through_the_session() {
    let mut store = setup();
    let mut session = Session::new(&mut store, YearMonth::new(2025, 2).unwrap());
    let mut balance = session.balance().unwrap();
    assert_eq!(*balance.borrow(), Decimal::from(750));

    session
        .store_mut()
        .insert_expense(&expense(50, at(2025, 2, 14)))
        .unwrap();
    assert_eq!(*balance.borrow_and_update(), Decimal::from(700));

    session
        .store_mut()
        .insert_income(&NewIncome {
            amount: Decimal::from(300),
            source: "Bonus".into(),
            frequency: Frequency::Monthly,
            registered_at: at(2025, 2, 20),
        })
        .unwrap();
    assert_eq!(*balance.borrow_and_update(), Decimal::from(1000));
}

#[test]
fn month_selection_is_observable() {
    let mut store = setup();
    let mut session = Session::new(&mut store, YearMonth::new(2025, 12).unwrap());
    let mut month = session.observe_month();
    session.shift_month(1).unwrap();
    assert!(month.has_changed().unwrap());
    assert_eq!(month.borrow_and_update().to_string(), "2026-01");
}

#[test]
fn month_shift_rolls_years() {
    let jan = YearMonth::new(2024, 1).unwrap();
    assert_eq!(jan.shift(-1), YearMonth::new(2023, 12));
    assert_eq!(jan.shift(-13), YearMonth::new(2022, 12));
    assert_eq!(jan.shift(23), YearMonth::new(2025, 12));
    assert_eq!(YearMonth::new(2024, 2).unwrap().last_day().to_string(), "2024-02-29");
    assert_eq!(YearMonth::new(2100, 2).unwrap().last_day().to_string(), "2100-02-28");
    assert!(YearMonth::new(2024, 0).is_none());
}

#[test]
fn month_shift_refuses_to_leave_the_calendar() {
    let jan = YearMonth::new(2024, 1).unwrap();
    assert_eq!(jan.shift(4_000_000), None);
    assert_eq!(jan.shift(i32::MAX), None);
    assert_eq!(jan.shift(i32::MIN), None);
    assert!(YearMonth::new(i32::MAX, 1).is_none());
    assert!("335360-02".parse::<YearMonth>().is_err());
}

#[test]
fn failed_shift_keeps_the_selected_month() {
    let mut store = setup();
    let mut session = Session::new(&mut store, YearMonth::new(2025, 2).unwrap());
    let mut balance = session.balance().unwrap();
    let err = session.shift_month(i32::MAX).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::MonthOutOfRange {
            months: i32::MAX,
            ..
        }
    ));
    assert_eq!(session.month(), YearMonth::new(2025, 2).unwrap());
    assert!(!balance.has_changed().unwrap());
    assert_eq!(*balance.borrow_and_update(), Decimal::from(750));
}

#[test]
fn dashboard_rejects_out_of_range_shift() {
    let mut store = setup();
    assert!(dashboard::build(&mut store, YearMonth::new(2025, 1).unwrap(), 4_000_000).is_err());
}

#[test]
fn dashboard_snapshot() {
    let mut store = setup();
    let d = dashboard::build(&mut store, YearMonth::new(2025, 1).unwrap(), 1).unwrap();
    assert_eq!(d.month, "2025-02");
    assert_eq!(d.income, Decimal::from(1000));
    assert_eq!(d.spent, Decimal::from(250));
    assert_eq!(d.balance, Decimal::from(750));
    assert_eq!(d.expenses, 2);
}
