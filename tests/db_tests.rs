// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cardclip::db;
use cardclip::models::NewCard;
use rust_decimal::Decimal;

#[test]
fn shared_handle_opens_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    {
        let mut store = db::shared(Some(&path)).unwrap();
        store
            .insert_card(&NewCard {
                bank: "Scotia".into(),
                credit_limit: Decimal::from(1000),
                closing_day: 1,
                due_day: 20,
                notify: true,
            })
            .unwrap();
    }
    // Later calls reuse the first handle whatever path they pass
    let other = dir.path().join("other.sqlite");
    let store = db::shared(Some(&other)).unwrap();
    assert_eq!(store.cards().unwrap().len(), 1);
    assert!(!other.exists());
}

#[test]
fn schema_init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.sqlite");
    let conn = db::open_or_init(Some(&path)).unwrap();
    conn.execute(
        "INSERT INTO settings(key, value) VALUES ('notifications', 'off')",
        [],
    )
    .unwrap();
    drop(conn);
    let conn = db::open_or_init(Some(&path)).unwrap();
    let value: String = conn
        .query_row("SELECT value FROM settings WHERE key='notifications'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(value, "off");
}
