// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::transfer::{self, TransferRequest};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, parse_endpoint, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            transfer::delete_transfer(conn, id)?;
            println!("Removed transfer {} and both legs", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = parse_endpoint(conn, sub.get_one::<String>("from").unwrap())?;
    let to = parse_endpoint(conn, sub.get_one::<String>("to").unwrap())?;
    let event = transfer::create_transfer(
        conn,
        TransferRequest {
            from,
            to,
            amount: parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?,
            date: parse_date(sub.get_one::<String>("date").unwrap().trim())?,
            description: sub
                .get_one::<String>("description")
                .cloned()
                .unwrap_or_else(|| "Transfer".to_string()),
            category: sub.get_one::<String>("category").cloned(),
        },
    )?;
    println!(
        "Transferred {} from {} to {} on {} (event {})",
        event.amount, event.from, event.to, event.date, event.id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let events = transfer::list_transfers(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &events)? {
        return Ok(());
    }
    let rows = events
        .into_iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.date.to_string(),
                e.from.to_string(),
                e.to.to_string(),
                e.amount.to_string(),
                e.description,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "Date", "From", "To", "Amount", "Description"], rows)
    );
    Ok(())
}
