// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::db;
use billfold::models::{AssetType, CardKind, Endpoint};
use billfold::store::{self, NewCard, NewPosition};
use billfold::transfer::{self, TransferRequest};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn debit_card(conn: &Connection, name: &str, opening: &str) -> i64 {
    store::create_card(
        conn,
        NewCard {
            name: name.into(),
            kind: Some(CardKind::Debit),
            opening_balance: Some(d(opening)),
            ..Default::default()
        },
    )
    .unwrap()
    .id
}

fn request(from: Endpoint, to: Endpoint, amount: &str) -> TransferRequest {
    TransferRequest {
        from,
        to,
        amount: d(amount),
        date: date(2025, 8, 10),
        description: "Move".into(),
        category: None,
    }
}

#[test]
fn card_to_cash_books_matched_legs() {
    let mut conn = setup();
    let card = debit_card(&conn, "Main", "1000");
    let event =
        transfer::create_transfer(&mut conn, request(Endpoint::Card(card), Endpoint::Cash, "200"))
            .unwrap();

    assert_eq!(store::card_balance(&conn, card).unwrap(), d("800"));

    let (out_leg, in_leg) = transfer::transfer_legs(&conn, event.id).unwrap();
    assert_eq!(out_leg.amount, d("-200"));
    assert_eq!(out_leg.card_id, Some(card));
    assert_eq!(in_leg.amount, d("200"));
    assert_eq!(in_leg.card_id, None);
    assert!(out_leg.is_internal_transfer);
    assert!(in_leg.is_internal_transfer);
    assert_eq!(out_leg.transfer_from, Some(Endpoint::Card(card)));
    assert_eq!(in_leg.transfer_to, Some(Endpoint::Cash));
}

#[test]
fn deleting_either_leg_removes_the_pair() {
    let mut conn = setup();
    let card = debit_card(&conn, "Main", "1000");
    let event =
        transfer::create_transfer(&mut conn, request(Endpoint::Card(card), Endpoint::Cash, "200"))
            .unwrap();
    let (out_leg, in_leg) = transfer::transfer_legs(&conn, event.id).unwrap();

    store::delete_transaction(&mut conn, in_leg.id).unwrap();

    assert!(transfer::get_transfer(&conn, event.id).is_err());
    assert!(store::get_transaction(&conn, out_leg.id).is_err());
    assert!(store::get_transaction(&conn, in_leg.id).is_err());
    assert_eq!(store::card_balance(&conn, card).unwrap(), d("1000"));
}

#[test]
fn deleting_the_event_removes_both_legs() {
    let mut conn = setup();
    let card = debit_card(&conn, "Main", "500");
    let event =
        transfer::create_transfer(&mut conn, request(Endpoint::Card(card), Endpoint::Cash, "100"))
            .unwrap();
    transfer::delete_transfer(&mut conn, event.id).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn transfers_between_cards_keep_both_sides() {
    let mut conn = setup();
    let a = debit_card(&conn, "A", "300");
    let b = debit_card(&conn, "B", "0");
    transfer::create_transfer(&mut conn, request(Endpoint::Card(a), Endpoint::Card(b), "120.50"))
        .unwrap();
    assert_eq!(store::card_balance(&conn, a).unwrap(), d("179.50"));
    assert_eq!(store::card_balance(&conn, b).unwrap(), d("120.50"));
}

#[test]
fn position_endpoints_book_their_legs_as_cash() {
    let mut conn = setup();
    let card = debit_card(&conn, "Main", "1000");
    let position = store::create_position(
        &conn,
        NewPosition {
            asset_type: AssetType::Stock,
            symbol: "AAPL".into(),
        },
    )
    .unwrap();
    let event = transfer::create_transfer(
        &mut conn,
        request(Endpoint::Card(card), Endpoint::Stock(position.id), "500"),
    )
    .unwrap();
    let (out_leg, in_leg) = transfer::transfer_legs(&conn, event.id).unwrap();
    assert_eq!(out_leg.card_id, Some(card));
    // the receiving side has no card to attach to
    assert_eq!(in_leg.card_id, None);
    assert_eq!(event.to, Endpoint::Stock(position.id));
}

#[test]
fn invalid_requests_leave_nothing_behind() {
    let mut conn = setup();
    let card = debit_card(&conn, "Main", "100");

    // non-positive amount
    assert!(
        transfer::create_transfer(&mut conn, request(Endpoint::Card(card), Endpoint::Cash, "0"))
            .is_err()
    );
    // identical endpoints
    assert!(
        transfer::create_transfer(
            &mut conn,
            request(Endpoint::Card(card), Endpoint::Card(card), "10")
        )
        .is_err()
    );
    // unknown card
    assert!(
        transfer::create_transfer(&mut conn, request(Endpoint::Card(999), Endpoint::Cash, "10"))
            .is_err()
    );
    // endpoint type must match the stored position
    let position = store::create_position(
        &conn,
        NewPosition {
            asset_type: AssetType::Crypto,
            symbol: "BTC".into(),
        },
    )
    .unwrap();
    assert!(
        transfer::create_transfer(
            &mut conn,
            request(Endpoint::Card(card), Endpoint::Stock(position.id), "10")
        )
        .is_err()
    );
    // blank description
    let mut req = request(Endpoint::Card(card), Endpoint::Cash, "10");
    req.description = "  ".into();
    assert!(transfer::create_transfer(&mut conn, req).is_err());

    let events: i64 = conn
        .query_row("SELECT COUNT(*) FROM transfer_events", [], |r| r.get(0))
        .unwrap();
    let legs: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(events, 0);
    assert_eq!(legs, 0);
}

#[test]
fn listing_orders_newest_first() {
    let mut conn = setup();
    let card = debit_card(&conn, "Main", "1000");
    for (day, amount) in [(1, "10"), (5, "20"), (3, "30")] {
        let mut req = request(Endpoint::Card(card), Endpoint::Cash, amount);
        req.date = date(2025, 8, day);
        transfer::create_transfer(&mut conn, req).unwrap();
    }
    let events = transfer::list_transfers(&conn).unwrap();
    let amounts: Vec<Decimal> = events.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![d("20"), d("30"), d("10")]);
}
