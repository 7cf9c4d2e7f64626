// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::db;
use billfold::error::CoreError;
use billfold::models::{AssetType, MovementKind};
use billfold::store::{self, NewMovement, NewPosition};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let position = store::create_position(
        &conn,
        NewPosition {
            asset_type: AssetType::Stock,
            symbol: "aapl".into(),
        },
    )
    .unwrap();
    assert_eq!(position.symbol, "AAPL");
    (conn, position.id)
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn movement(position_id: i64, kind: MovementKind, qty: &str, price: &str, when: NaiveDateTime) -> NewMovement {
    NewMovement {
        position_id,
        kind,
        quantity: d(qty),
        price_per_unit: d(price),
        total_amount: None,
        datetime: when,
        description: None,
    }
}

#[test]
fn stored_log_replays_to_holdings() {
    let (mut conn, pos) = setup();
    store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "10", "150", at(1, 10)))
        .unwrap();
    store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "5", "160", at(2, 10)))
        .unwrap();
    let h = store::position_holdings(&conn, pos).unwrap();
    assert_eq!(h.held_quantity, d("15"));
    assert_eq!(h.cost_basis, d("2300"));
    assert_eq!(h.average_cost, d("153.33"));
}

#[test]
fn supplied_total_is_checked_within_a_cent() {
    let (mut conn, pos) = setup();
    let mut spec = movement(pos, MovementKind::Buy, "10", "150", at(1, 10));
    spec.total_amount = Some(d("1500.01"));
    // off by one cent: accepted, the derived total wins
    let m = store::create_movement(&mut conn, spec).unwrap();
    assert_eq!(m.total_amount, d("1500.00"));

    let mut spec = movement(pos, MovementKind::Buy, "10", "150", at(1, 11));
    spec.total_amount = Some(d("1501.50"));
    let err = store::create_movement(&mut conn, spec).unwrap_err();
    assert!(matches!(err, CoreError::Consistency(_)));
}

#[test]
fn oversell_rolls_back_and_leaves_the_log_untouched() {
    let (mut conn, pos) = setup();
    store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "5", "100", at(1, 10)))
        .unwrap();
    let err =
        store::create_movement(&mut conn, movement(pos, MovementKind::Sell, "10", "110", at(2, 10)))
            .unwrap_err();
    assert!(matches!(err, CoreError::InsufficientHoldings { .. }));

    let log = store::list_movements(&conn, pos).unwrap();
    assert_eq!(log.len(), 1);
    let h = store::position_holdings(&conn, pos).unwrap();
    assert_eq!(h.held_quantity, d("5"));
    assert_eq!(h.cost_basis, d("500"));
}

#[test]
fn replay_orders_by_event_time_not_insertion() {
    let (mut conn, pos) = setup();
    // the sell is inserted first but dated after the buy
    assert!(
        store::create_movement(&mut conn, movement(pos, MovementKind::Sell, "3", "120", at(5, 10)))
            .is_err()
    );
    store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "5", "100", at(1, 10)))
        .unwrap();
    store::create_movement(&mut conn, movement(pos, MovementKind::Sell, "3", "120", at(5, 10)))
        .unwrap();
    let h = store::position_holdings(&conn, pos).unwrap();
    assert_eq!(h.held_quantity, d("2"));
    assert_eq!(h.realized_pl, d("60.00"));
}

#[test]
fn deleting_a_buy_that_funds_a_later_sell_is_refused() {
    let (mut conn, pos) = setup();
    let buy =
        store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "5", "100", at(1, 10)))
            .unwrap();
    store::create_movement(&mut conn, movement(pos, MovementKind::Sell, "5", "110", at(2, 10)))
        .unwrap();
    assert!(store::delete_movement(&mut conn, buy.id).is_err());
    assert_eq!(store::list_movements(&conn, pos).unwrap().len(), 2);
}

#[test]
fn deleting_an_unreferenced_movement_succeeds() {
    let (mut conn, pos) = setup();
    store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "5", "100", at(1, 10)))
        .unwrap();
    let second =
        store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "5", "120", at(2, 10)))
            .unwrap();
    store::delete_movement(&mut conn, second.id).unwrap();
    let h = store::position_holdings(&conn, pos).unwrap();
    assert_eq!(h.held_quantity, d("5"));
    assert_eq!(h.average_cost, d("100.00"));
}

#[test]
fn quantity_and_price_must_be_positive() {
    let (mut conn, pos) = setup();
    assert!(
        store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "0", "100", at(1, 10)))
            .is_err()
    );
    assert!(
        store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "1", "-5", at(1, 10)))
            .is_err()
    );
}

#[test]
fn deleting_the_position_takes_its_log_with_it() {
    let (mut conn, pos) = setup();
    let m = store::create_movement(&mut conn, movement(pos, MovementKind::Buy, "1", "50", at(1, 10)))
        .unwrap();
    store::delete_position(&conn, pos).unwrap();
    assert!(store::get_movement(&conn, m.id).is_err());
}
