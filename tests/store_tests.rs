// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::db;
use billfold::models::CardKind;
use billfold::store::{
    self, DeletePolicy, NewCard, NewSection, NewTransaction, TransactionFilter,
};
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

fn spend(conn: &Connection, card_id: Option<i64>, date_s: &str, amount: &str, desc: &str) -> i64 {
    store::create_transaction(
        conn,
        NewTransaction {
            date: NaiveDate::from_str(date_s).unwrap(),
            amount: d(amount),
            description: desc.into(),
            card_id,
            section_id: None,
            category: None,
        },
    )
    .unwrap()
    .id
}

#[test]
fn card_creation_is_validated() {
    let conn = setup();
    // kind is mandatory
    assert!(
        store::create_card(
            &conn,
            NewCard {
                name: "NoKind".into(),
                ..Default::default()
            }
        )
        .is_err()
    );
    // credit requires a positive limit and takes no opening balance
    assert!(
        store::create_card(
            &conn,
            NewCard {
                name: "Plastic".into(),
                kind: Some(CardKind::Credit),
                ..Default::default()
            }
        )
        .is_err()
    );
    assert!(
        store::create_card(
            &conn,
            NewCard {
                name: "Plastic".into(),
                kind: Some(CardKind::Credit),
                credit_limit: Some(d("5000")),
                opening_balance: Some(d("10")),
                ..Default::default()
            }
        )
        .is_err()
    );
    // debit takes no limit
    assert!(
        store::create_card(
            &conn,
            NewCard {
                name: "Main".into(),
                kind: Some(CardKind::Debit),
                credit_limit: Some(d("5000")),
                ..Default::default()
            }
        )
        .is_err()
    );
    // names are unique
    debit_card(&conn, "Main", "0");
    assert!(
        store::create_card(
            &conn,
            NewCard {
                name: "Main".into(),
                kind: Some(CardKind::Debit),
                ..Default::default()
            }
        )
        .is_err()
    );
}

#[test]
fn debit_balance_is_opening_plus_log() {
    let conn = setup();
    let card = debit_card(&conn, "Main", "1000");
    spend(&conn, Some(card), "2025-08-01", "-200", "Groceries");
    spend(&conn, Some(card), "2025-08-02", "50", "Refund");
    assert_eq!(store::card_balance(&conn, card).unwrap(), d("850"));
}

#[test]
fn credit_card_tracks_used_and_available() {
    let conn = setup();
    let card = store::create_card(
        &conn,
        NewCard {
            name: "Plastic".into(),
            kind: Some(CardKind::Credit),
            credit_limit: Some(d("5000")),
            ..Default::default()
        },
    )
    .unwrap()
    .id;
    spend(&conn, Some(card), "2025-08-01", "-1200", "Laptop");
    assert_eq!(store::card_used_credit(&conn, card).unwrap(), d("1200"));
    assert_eq!(store::card_available_credit(&conn, card).unwrap(), d("3800"));
    // the balance accessor is debit-only
    assert!(store::card_balance(&conn, card).is_err());
}

#[test]
fn delete_card_blocks_on_history_unless_cascaded() {
    let mut conn = setup();
    let card = debit_card(&conn, "Main", "0");
    spend(&conn, Some(card), "2025-08-01", "-10", "Coffee");
    assert!(store::delete_card(&mut conn, card, DeletePolicy::Block).is_err());
    store::delete_card(&mut conn, card, DeletePolicy::Cascade).unwrap();
    assert!(store::get_card(&conn, card).is_err());
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn section_balance_includes_its_initial_offset() {
    let conn = setup();
    let card = debit_card(&conn, "Main", "0");
    let section = store::create_section(
        &conn,
        NewSection {
            card_id: card,
            name: "Savings".into(),
            initial_balance: Some(d("100")),
        },
    )
    .unwrap();
    store::create_transaction(
        &conn,
        NewTransaction {
            date: date(2025, 8, 1),
            amount: d("25"),
            description: "Top up".into(),
            card_id: Some(card),
            section_id: Some(section.id),
            category: None,
        },
    )
    .unwrap();
    assert_eq!(store::section_balance(&conn, section.id).unwrap(), d("125"));
}

#[test]
fn section_must_belong_to_the_transaction_card() {
    let conn = setup();
    let a = debit_card(&conn, "A", "0");
    let b = debit_card(&conn, "B", "0");
    let section = store::create_section(
        &conn,
        NewSection {
            card_id: a,
            name: "Savings".into(),
            initial_balance: None,
        },
    )
    .unwrap();
    let err = store::create_transaction(
        &conn,
        NewTransaction {
            date: date(2025, 8, 1),
            amount: d("10"),
            description: "Wrong card".into(),
            card_id: Some(b),
            section_id: Some(section.id),
            category: None,
        },
    );
    assert!(err.is_err());
}

#[test]
fn deleting_a_section_keeps_its_transactions_on_the_card() {
    let conn = setup();
    let card = debit_card(&conn, "Main", "0");
    let section = store::create_section(
        &conn,
        NewSection {
            card_id: card,
            name: "Savings".into(),
            initial_balance: None,
        },
    )
    .unwrap();
    let tx_id = store::create_transaction(
        &conn,
        NewTransaction {
            date: date(2025, 8, 1),
            amount: d("-30"),
            description: "From savings".into(),
            card_id: Some(card),
            section_id: Some(section.id),
            category: None,
        },
    )
    .unwrap()
    .id;
    store::delete_section(&conn, section.id).unwrap();
    let t = store::get_transaction(&conn, tx_id).unwrap();
    assert_eq!(t.card_id, Some(card));
    assert_eq!(t.section_id, None);
}

#[test]
fn empty_description_and_zero_amount_are_rejected() {
    let conn = setup();
    let base = NewTransaction {
        date: date(2025, 8, 1),
        amount: d("10"),
        description: "ok".into(),
        card_id: None,
        section_id: None,
        category: None,
    };
    assert!(
        store::create_transaction(
            &conn,
            NewTransaction {
                description: "   ".into(),
                ..base.clone()
            }
        )
        .is_err()
    );
    assert!(
        store::create_transaction(
            &conn,
            NewTransaction {
                amount: Decimal::ZERO,
                ..base
            }
        )
        .is_err()
    );
}

#[test]
fn listing_pages_newest_first_with_stable_ties() {
    let conn = setup();
    for i in 1..=5 {
        spend(&conn, None, &format!("2025-08-0{}", i), "-1", "P");
    }
    let page1 = store::list_transactions(
        &conn,
        &TransactionFilter {
            per_page: 2,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(page1.total, 5);
    assert!(page1.has_next);
    assert_eq!(page1.items.len(), 2);
    assert_eq!(page1.items[0].date, date(2025, 8, 5));
    assert_eq!(page1.items[1].date, date(2025, 8, 4));

    let page3 = store::list_transactions(
        &conn,
        &TransactionFilter {
            page: 3,
            per_page: 2,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(page3.items.len(), 1);
    assert!(!page3.has_next);
    assert_eq!(page3.items[0].date, date(2025, 8, 1));
}

#[test]
fn filters_compose() {
    let conn = setup();
    let card = debit_card(&conn, "Main", "0");
    spend(&conn, Some(card), "2025-08-01", "-10", "On card");
    spend(&conn, None, "2025-08-02", "-20", "Cash spend");
    store::create_transaction(
        &conn,
        NewTransaction {
            date: date(2025, 8, 3),
            amount: d("-5"),
            description: "Categorized".into(),
            card_id: None,
            section_id: None,
            category: Some("food".into()),
        },
    )
    .unwrap();

    let on_card = store::list_transactions(
        &conn,
        &TransactionFilter {
            card_id: Some(card),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(on_card.total, 1);

    let cash = store::list_transactions(
        &conn,
        &TransactionFilter {
            cash_only: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(cash.total, 2);

    let food = store::list_transactions(
        &conn,
        &TransactionFilter {
            category: Some("food".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(food.total, 1);
    assert_eq!(food.items[0].description, "Categorized");

    let windowed = store::list_transactions(
        &conn,
        &TransactionFilter {
            from: Some(date(2025, 8, 2)),
            to: Some(date(2025, 8, 2)),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(windowed.total, 1);
    assert_eq!(windowed.items[0].description, "Cash spend");
}

#[test]
fn default_currency_round_trips_through_settings() {
    let conn = setup();
    assert_eq!(store::default_currency(&conn).unwrap(), "MXN");
    store::set_default_currency(&conn, "usd").unwrap();
    assert_eq!(store::default_currency(&conn).unwrap(), "USD");
    let card = debit_card(&conn, "Main", "0");
    assert_eq!(store::get_card(&conn, card).unwrap().currency, "USD");
}
