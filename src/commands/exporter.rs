// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        Some(("movements", sub)) => export_movements(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT t.date, t.amount, t.description, c.name as card, s.name as section,
                t.category, t.transfer_event_id
         FROM transactions t
         LEFT JOIN cards c ON t.card_id=c.id
         LEFT JOIN sections s ON t.section_id=s.id
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, Option<i64>>(6)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date", "amount", "description", "card", "section", "category", "transfer",
            ])?;
            for row in rows {
                let (d, amt, desc, card, section, cat, event) = row?;
                wtr.write_record([
                    d,
                    amt,
                    desc,
                    card.unwrap_or_else(|| "cash".into()),
                    section.unwrap_or_default(),
                    cat.unwrap_or_default(),
                    event.map(|_| "yes".into()).unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, amt, desc, card, section, cat, event) = row?;
                items.push(json!({
                    "date": d,
                    "amount": amt,
                    "description": desc,
                    "card": card,
                    "section": section,
                    "category": cat,
                    "is_internal_transfer": event.is_some(),
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => anyhow::bail!("Unknown format: {} (use csv|json)", fmt),
    }
    println!("Exported transactions to {}", out);
    Ok(())
}

fn export_movements(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT m.datetime, p.asset_type, p.symbol, m.kind, m.quantity,
                m.price_per_unit, m.total_amount, m.description
         FROM movements m
         JOIN positions p ON m.position_id=p.id
         ORDER BY m.datetime, m.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, Option<String>>(7)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "datetime",
                "asset_type",
                "symbol",
                "kind",
                "quantity",
                "price_per_unit",
                "total_amount",
                "description",
            ])?;
            for row in rows {
                let (dt, at, sym, kind, qty, price, total, desc) = row?;
                wtr.write_record([dt, at, sym, kind, qty, price, total, desc.unwrap_or_default()])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (dt, at, sym, kind, qty, price, total, desc) = row?;
                items.push(json!({
                    "datetime": dt,
                    "asset_type": at,
                    "symbol": sym,
                    "kind": kind,
                    "quantity": qty,
                    "price_per_unit": price,
                    "total_amount": total,
                    "description": desc,
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => anyhow::bail!("Unknown format: {} (use csv|json)", fmt),
    }
    println!("Exported movements to {}", out);
    Ok(())
}
