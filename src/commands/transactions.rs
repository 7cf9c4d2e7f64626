// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{self, NewTransaction, TransactionFilter, TransactionPage};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            store::delete_transaction(conn, id)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card = sub
        .get_one::<String>("card")
        .map(|name| store::get_card_by_name(conn, name))
        .transpose()?;
    let section_id = match (&card, sub.get_one::<String>("section")) {
        (Some(card), Some(name)) => Some(
            store::list_sections(conn, card.id)?
                .into_iter()
                .find(|s| s.name == name.trim())
                .map(|s| s.id)
                .ok_or_else(|| {
                    anyhow::anyhow!("Section '{}' not found on card '{}'", name, card.name)
                })?,
        ),
        (None, Some(_)) => {
            anyhow::bail!("A section requires a card");
        }
        _ => None,
    };
    let t = store::create_transaction(
        conn,
        NewTransaction {
            date: parse_date(sub.get_one::<String>("date").unwrap().trim())?,
            amount: parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?,
            description: sub.get_one::<String>("description").unwrap().clone(),
            card_id: card.as_ref().map(|c| c.id),
            section_id,
            category: sub.get_one::<String>("category").cloned(),
        },
    )?;
    let account = card.map(|c| c.name).unwrap_or_else(|| "cash".to_string());
    println!("Recorded {} on {} at '{}' ({})", t.amount, t.date, t.description, account);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let page = query_page(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &page.items)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = page
        .items
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date.to_string(),
                t.amount.to_string(),
                t.description.clone(),
                t.card_id.map(|id| id.to_string()).unwrap_or_else(|| "cash".into()),
                t.category.clone().unwrap_or_default(),
                if t.is_internal_transfer { "transfer".into() } else { String::new() },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Date", "Amount", "Description", "Card", "Category", ""],
            rows,
        )
    );
    println!(
        "page {}/{} ({} total)",
        page.page,
        page.total.div_ceil(page.per_page).max(1),
        page.total
    );
    Ok(())
}

pub fn query_page(conn: &Connection, sub: &clap::ArgMatches) -> Result<TransactionPage> {
    let card_id = sub
        .get_one::<String>("card")
        .map(|name| store::get_card_by_name(conn, name).map(|c| c.id))
        .transpose()?;
    let filter = TransactionFilter {
        card_id,
        cash_only: sub.get_flag("cash"),
        category: sub.get_one::<String>("category").cloned(),
        from: sub
            .get_one::<String>("from")
            .map(|s| parse_date(s.trim()))
            .transpose()?,
        to: sub
            .get_one::<String>("to")
            .map(|s| parse_date(s.trim()))
            .transpose()?,
        include_transfers: !sub.get_flag("no-transfers"),
        page: sub.get_one::<u64>("page").copied().unwrap_or(1),
        per_page: sub.get_one::<u64>("per-page").copied().unwrap_or(50),
    };
    Ok(store::list_transactions(conn, &filter)?)
}
