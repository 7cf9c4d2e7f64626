// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AssetType;
use crate::store::{self, NewPosition};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

fn asset_type(sub: &clap::ArgMatches) -> Result<AssetType> {
    Ok(sub.get_one::<String>("asset-type").unwrap().trim().parse()?)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let position = store::create_position(
                conn,
                NewPosition {
                    asset_type: asset_type(sub)?,
                    symbol: sub.get_one::<String>("symbol").unwrap().clone(),
                },
            )?;
            println!(
                "Added {} position {}",
                position.asset_type.as_str(),
                position.symbol
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let position =
                store::get_position_by_symbol(conn, asset_type(sub)?, sub.get_one::<String>("symbol").unwrap())?;
            store::delete_position(conn, position.id)?;
            println!(
                "Removed position {} and its movement log",
                position.symbol
            );
        }
        Some(("summary", sub)) => summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let positions = store::list_positions(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &positions)? {
        return Ok(());
    }
    let prices = store::latest_prices(conn)?;
    let mut rows = Vec::new();
    for position in &positions {
        let holdings = store::position_holdings(conn, position.id)?;
        let value = match prices.get(&position.id) {
            Some(price) => holdings.market_value(*price).to_string(),
            None => format!("{} (at cost)", holdings.cost_basis),
        };
        rows.push(vec![
            position.asset_type.as_str().to_string(),
            position.symbol.clone(),
            holdings.held_quantity.to_string(),
            holdings.average_cost.to_string(),
            value,
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Type", "Symbol", "Held", "Avg Cost", "Value"], rows)
    );
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let position =
        store::get_position_by_symbol(conn, asset_type(sub)?, sub.get_one::<String>("symbol").unwrap())?;
    let holdings = store::position_holdings(conn, position.id)?;
    let market_price = sub
        .get_one::<String>("price")
        .map(|s| parse_decimal(s.trim()))
        .transpose()?;

    if sub.get_flag("json") {
        let mut v = serde_json::to_value(&holdings)?;
        if let Some(price) = market_price {
            v["unrealized_pl"] = json!(holdings.unrealized_pl(price));
            v["market_value"] = json!(holdings.market_value(price));
        }
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }

    let mut rows = vec![
        vec!["held quantity".to_string(), holdings.held_quantity.to_string()],
        vec!["average cost".to_string(), holdings.average_cost.to_string()],
        vec!["cost basis".to_string(), holdings.cost_basis.to_string()],
        vec!["realized P&L".to_string(), holdings.realized_pl.to_string()],
    ];
    if let Some(price) = market_price {
        rows.push(vec![
            "unrealized P&L".to_string(),
            holdings.unrealized_pl(price).to_string(),
        ]);
        rows.push(vec![
            "market value".to_string(),
            holdings.market_value(price).to_string(),
        ]);
    }
    println!("{}", pretty_table(&[position.symbol.as_str(), ""], rows));
    Ok(())
}
