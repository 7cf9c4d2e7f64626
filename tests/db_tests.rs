// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::db;
use billfold::models::CardKind;
use billfold::store::{self, NewCard};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::tempdir;

#[test]
fn data_survives_a_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("billfold.sqlite");

    {
        let mut conn = Connection::open(&path).unwrap();
        db::init_schema(&mut conn).unwrap();
        store::create_card(
            &conn,
            NewCard {
                name: "Main".into(),
                kind: Some(CardKind::Debit),
                opening_balance: Some(Decimal::from_str("123.45").unwrap()),
                ..Default::default()
            },
        )
        .unwrap();
    }

    let mut conn = Connection::open(&path).unwrap();
    // schema init is idempotent over an existing database
    db::init_schema(&mut conn).unwrap();
    let card = store::get_card_by_name(&conn, "Main").unwrap();
    assert_eq!(
        card.opening_balance,
        Some(Decimal::from_str("123.45").unwrap())
    );
    assert_eq!(
        store::card_balance(&conn, card.id).unwrap(),
        Decimal::from_str("123.45").unwrap()
    );
}

#[test]
fn foreign_keys_are_enforced_per_connection() {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    // a transaction cannot point at a card that was never created
    let err = conn.execute(
        "INSERT INTO transactions(date, amount, description, card_id) VALUES ('2025-01-01','-1','x',999)",
        [],
    );
    assert!(err.is_err());
}
