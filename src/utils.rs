// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{AssetType, Endpoint};
use crate::money::round_money;
use crate::store;
use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts a full timestamp or a bare date (taken as midnight).
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).unwrap());
    }
    Err(anyhow!(
        "Invalid datetime '{}', expected YYYY-MM-DD[THH:MM:SS]",
        s
    ))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// CLI endpoint syntax: `cash`, `card:NAME`, `stock:SYMBOL`, `crypto:SYMBOL`.
/// Names/symbols resolve to ids here so the engines only ever see ids.
pub fn parse_endpoint(conn: &Connection, s: &str) -> Result<Endpoint> {
    let s = s.trim();
    if s == "cash" {
        return Ok(Endpoint::Cash);
    }
    let (kind, target) = s
        .split_once(':')
        .with_context(|| format!("Invalid endpoint '{}', expected cash|card:NAME|stock:SYM|crypto:SYM", s))?;
    match kind {
        "card" => {
            let card = store::get_card_by_name(conn, target)?;
            Ok(Endpoint::Card(card.id))
        }
        "stock" => {
            let position = store::get_position_by_symbol(conn, AssetType::Stock, target)?;
            Ok(Endpoint::Stock(position.id))
        }
        "crypto" => {
            let position = store::get_position_by_symbol(conn, AssetType::Crypto, target)?;
            Ok(Endpoint::Crypto(position.id))
        }
        other => Err(anyhow!(
            "Unknown endpoint type '{}', expected card|cash|stock|crypto",
            other
        )),
    }
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, round_money(*d))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn fmt_money_rounds_midpoints_away_from_zero() {
        assert_eq!(fmt_money(&d("2.005"), "MXN"), "MXN 2.01");
        assert_eq!(fmt_money(&d("-2.005"), "MXN"), "MXN -2.01");
        assert_eq!(fmt_money(&d("153.335"), "USD"), "USD 153.34");
    }
}
