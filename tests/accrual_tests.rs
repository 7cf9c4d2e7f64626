// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::accrual;
use billfold::db;
use billfold::models::{CardKind, CompoundFrequency, PaymentFrequency};
use billfold::store::{self, NewAccrual, NewCard};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let card = store::create_card(
        &conn,
        NewCard {
            name: "Plastic".into(),
            kind: Some(CardKind::Credit),
            credit_limit: Some(d("5000")),
            ..Default::default()
        },
    )
    .unwrap();
    (conn, card.id)
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn accrual_spec(card_id: i64, name: &str) -> NewAccrual {
    NewAccrual {
        card_id,
        name: name.into(),
        rate: d("5"),
        is_fee: false,
        payment_frequency: None,
        compound_frequency: None,
    }
}

#[test]
fn unset_frequencies_fall_back_to_defaults() {
    let (conn, card) = setup();
    let a = store::create_accrual(&conn, accrual_spec(card, "APR")).unwrap();
    assert_eq!(a.payment_frequency, PaymentFrequency::Annually);
    assert_eq!(a.compound_frequency, CompoundFrequency::Daily365);
    assert!(a.is_active);
}

#[test]
fn names_are_unique_per_card_not_globally() {
    let (conn, card) = setup();
    store::create_accrual(&conn, accrual_spec(card, "APR")).unwrap();
    assert!(store::create_accrual(&conn, accrual_spec(card, "APR")).is_err());

    let other = store::create_card(
        &conn,
        NewCard {
            name: "Second".into(),
            kind: Some(CardKind::Credit),
            credit_limit: Some(d("1000")),
            ..Default::default()
        },
    )
    .unwrap();
    store::create_accrual(&conn, accrual_spec(other.id, "APR")).unwrap();
}

#[test]
fn negative_rates_and_blank_names_are_rejected() {
    let (conn, card) = setup();
    let mut spec = accrual_spec(card, "Bad");
    spec.rate = d("-1");
    assert!(store::create_accrual(&conn, spec).is_err());
    assert!(store::create_accrual(&conn, accrual_spec(card, "  ")).is_err());
}

#[test]
fn toggling_flips_activity_without_touching_terms() {
    let (conn, card) = setup();
    let a = store::create_accrual(&conn, accrual_spec(card, "APR")).unwrap();
    let off = store::set_accrual_active(&conn, a.id, false).unwrap();
    assert!(!off.is_active);
    assert_eq!(off.rate, a.rate);
    let on = store::set_accrual_active(&conn, a.id, true).unwrap();
    assert!(on.is_active);
}

#[test]
fn projection_skips_inactive_terms() {
    let (conn, card) = setup();
    let mut interest = accrual_spec(card, "APR");
    interest.compound_frequency = Some(CompoundFrequency::Monthly12);
    store::create_accrual(&conn, interest).unwrap();

    let mut fee = accrual_spec(card, "Maintenance");
    fee.rate = d("2");
    fee.is_fee = true;
    let fee = store::create_accrual(&conn, fee).unwrap();
    store::set_accrual_active(&conn, fee.id, false).unwrap();

    let projection = accrual::card_projection(&conn, card, d("1000"), 12).unwrap();
    assert_eq!(projection.breakdown.len(), 1);
    assert_eq!(projection.total_fees, Decimal::ZERO);
    // 5% nominal, compounded monthly over a civil year
    assert_eq!(projection.total_interest, d("51.16"));
    assert_eq!(projection.final_amount, d("1051.16"));
}

#[test]
fn fees_pull_the_projection_down() {
    let (conn, card) = setup();
    let mut fee = accrual_spec(card, "Maintenance");
    fee.rate = d("2");
    fee.is_fee = true;
    store::create_accrual(&conn, fee).unwrap();

    let projection = accrual::card_projection(&conn, card, d("1000"), 12).unwrap();
    assert!(projection.total_fees > Decimal::ZERO);
    assert!(projection.final_amount < d("1000"));
    // the breakdown line itself carries the negated amount
    assert_eq!(projection.breakdown[0].amount, -projection.total_fees);
}

#[test]
fn card_delete_cascades_its_accruals() {
    let (mut conn, card) = setup();
    let a = store::create_accrual(&conn, accrual_spec(card, "APR")).unwrap();
    store::delete_card(&mut conn, card, store::DeletePolicy::Cascade).unwrap();
    assert!(store::get_accrual(&conn, a.id).is_err());
}
