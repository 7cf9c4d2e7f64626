// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CardKind;
use crate::money::{money_eq_within_tolerance, round_money};
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Transfer events that do not own exactly two legs
    let mut stmt = conn.prepare(
        "SELECT e.id, COUNT(t.id) FROM transfer_events e
         LEFT JOIN transactions t ON t.transfer_event_id=e.id
         GROUP BY e.id HAVING COUNT(t.id) != 2",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let n: i64 = r.get(1)?;
        rows.push(vec!["transfer_leg_count".into(), format!("event {} has {} legs", id, n)]);
    }

    // 2) Leg pairs that do not cancel out
    let mut stmt = conn.prepare(
        "SELECT transfer_event_id, amount FROM transactions
         WHERE transfer_event_id IS NOT NULL ORDER BY transfer_event_id",
    )?;
    let mut sums: std::collections::BTreeMap<i64, Decimal> = Default::default();
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let event: i64 = r.get(0)?;
        let amount: String = r.get(1)?;
        let amount = Decimal::from_str(&amount)
            .map_err(|_| anyhow::anyhow!("unreadable amount on transfer event {}", event))?;
        *sums.entry(event).or_insert(Decimal::ZERO) += amount;
    }
    for (event, sum) in sums {
        if sum != Decimal::ZERO {
            rows.push(vec!["transfer_not_balanced".into(), format!("event {} sums to {}", event, sum)]);
        }
    }

    // 3) Movements whose stored total disagrees with quantity x price
    let mut stmt = conn.prepare(
        "SELECT id, quantity, price_per_unit, total_amount FROM movements ORDER BY id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let qty: String = r.get(1)?;
        let price: String = r.get(2)?;
        let total: String = r.get(3)?;
        match (
            Decimal::from_str(&qty),
            Decimal::from_str(&price),
            Decimal::from_str(&total),
        ) {
            (Ok(qty), Ok(price), Ok(total)) => {
                if !money_eq_within_tolerance(round_money(qty * price), total) {
                    rows.push(vec![
                        "movement_total_mismatch".into(),
                        format!("movement {}: {} vs {} x {}", id, total, qty, price),
                    ]);
                }
            }
            _ => rows.push(vec!["movement_unreadable".into(), format!("movement {}", id)]),
        }
    }

    // 4) Positions whose movement log no longer replays cleanly
    for position in store::list_positions(conn)? {
        if let Err(e) = store::position_holdings(conn, position.id) {
            rows.push(vec![
                "position_replay_failed".into(),
                format!("{} {}: {}", position.asset_type.as_str(), position.symbol, e),
            ]);
        }
    }

    // 5) Credit cards over their limit
    for card in store::list_cards(conn)? {
        if card.kind != CardKind::Credit {
            continue;
        }
        let used = store::card_used_credit(conn, card.id)?;
        if let Some(limit) = card.credit_limit {
            if used > limit {
                rows.push(vec![
                    "credit_over_limit".into(),
                    format!("card '{}' uses {} of {}", card.name, used, limit),
                ]);
            }
        }
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
