// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{AssetType, MovementKind};
use crate::store::{self, NewMovement};
use crate::utils::{maybe_print_json, parse_datetime, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("buy", sub)) => record(conn, sub, MovementKind::Buy)?,
        Some(("sell", sub)) => record(conn, sub, MovementKind::Sell)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            store::delete_movement(conn, id)?;
            println!("Removed movement {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn record(conn: &mut Connection, sub: &clap::ArgMatches, kind: MovementKind) -> Result<()> {
    let asset_type: AssetType = sub.get_one::<String>("asset-type").unwrap().trim().parse()?;
    let position =
        store::get_position_by_symbol(conn, asset_type, sub.get_one::<String>("symbol").unwrap())?;
    let movement = store::create_movement(
        conn,
        NewMovement {
            position_id: position.id,
            kind,
            quantity: parse_decimal(sub.get_one::<String>("quantity").unwrap().trim())?,
            price_per_unit: parse_decimal(sub.get_one::<String>("price").unwrap().trim())?,
            total_amount: sub
                .get_one::<String>("total")
                .map(|s| parse_decimal(s.trim()))
                .transpose()?,
            datetime: parse_datetime(sub.get_one::<String>("datetime").unwrap().trim())?,
            description: sub.get_one::<String>("description").cloned(),
        },
    )?;
    println!(
        "Recorded {} {} x {} @ {} (total {})",
        movement.kind.as_str(),
        movement.quantity,
        position.symbol,
        movement.price_per_unit,
        movement.total_amount
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let asset_type: AssetType = sub.get_one::<String>("asset-type").unwrap().trim().parse()?;
    let position =
        store::get_position_by_symbol(conn, asset_type, sub.get_one::<String>("symbol").unwrap())?;
    let movements = store::list_movements(conn, position.id)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &movements)? {
        return Ok(());
    }
    let rows = movements
        .into_iter()
        .map(|m| {
            vec![
                m.id.to_string(),
                m.datetime.to_string(),
                m.kind.as_str().to_string(),
                m.quantity.to_string(),
                m.price_per_unit.to_string(),
                m.total_amount.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "When", "Kind", "Qty", "Price", "Total"], rows)
    );
    Ok(())
}
