// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AssetType;
use crate::store;
use crate::utils::{parse_datetime, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let asset_type: AssetType =
                sub.get_one::<String>("asset-type").unwrap().trim().parse()?;
            let position = store::get_position_by_symbol(
                conn,
                asset_type,
                sub.get_one::<String>("symbol").unwrap(),
            )?;
            let as_of = match sub.get_one::<String>("as-of") {
                Some(s) => parse_datetime(s.trim())?,
                None => Local::now().naive_local(),
            };
            let source = sub
                .get_one::<String>("source")
                .map(String::as_str)
                .unwrap_or("manual");
            let point = store::set_price(
                conn,
                position.id,
                as_of,
                parse_decimal(sub.get_one::<String>("price").unwrap().trim())?,
                source,
            )?;
            println!("{} = {} as of {}", position.symbol, point.price, point.as_of);
        }
        Some(("list", _)) => {
            let rows = store::list_prices(conn, 50)?
                .into_iter()
                .map(|(symbol, p)| {
                    vec![
                        symbol,
                        p.price.to_string(),
                        p.as_of.to_string(),
                        p.source,
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Symbol", "Price", "As of", "Source"], rows)
            );
        }
        _ => {}
    }
    Ok(())
}
