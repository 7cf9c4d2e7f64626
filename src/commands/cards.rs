// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CardKind;
use crate::store::{self, CardUpdate, DeletePolicy, NewCard};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("rename", sub)) => rename(conn, sub)?,
        Some(("set-limit", sub)) => set_limit(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: CardKind = sub.get_one::<String>("kind").unwrap().trim().parse()?;
    let card = store::create_card(
        conn,
        NewCard {
            name: sub.get_one::<String>("name").unwrap().clone(),
            kind: Some(kind),
            currency: sub.get_one::<String>("currency").cloned(),
            opening_balance: sub
                .get_one::<String>("opening-balance")
                .map(|s| parse_decimal(s.trim()))
                .transpose()?,
            credit_limit: sub
                .get_one::<String>("limit")
                .map(|s| parse_decimal(s.trim()))
                .transpose()?,
        },
    )?;
    println!(
        "Added {} card '{}' ({})",
        card.kind.as_str(),
        card.name,
        card.currency
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cards = store::list_cards(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cards)? {
        return Ok(());
    }
    let mut rows = Vec::new();
    for card in &cards {
        let figure = match card.kind {
            CardKind::Debit => format!("balance {}", store::card_balance(conn, card.id)?),
            CardKind::Credit => format!(
                "available {}",
                store::card_available_credit(conn, card.id)?
            ),
        };
        rows.push(vec![
            card.name.clone(),
            card.kind.as_str().to_string(),
            card.currency.clone(),
            figure,
            card.created_at.clone(),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Name", "Kind", "CCY", "Current", "Created"], rows)
    );
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let card = store::get_card_by_name(conn, name)?;
    let policy = if sub.get_flag("force") {
        DeletePolicy::Cascade
    } else {
        DeletePolicy::Block
    };
    store::delete_card(conn, card.id, policy)?;
    println!("Removed card '{}'", card.name);
    Ok(())
}

fn rename(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card = store::get_card_by_name(conn, sub.get_one::<String>("name").unwrap())?;
    let updated = store::update_card(
        conn,
        card.id,
        CardUpdate {
            name: sub.get_one::<String>("new-name").cloned(),
            credit_limit: None,
        },
    )?;
    println!("Renamed card '{}' to '{}'", card.name, updated.name);
    Ok(())
}

fn set_limit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card = store::get_card_by_name(conn, sub.get_one::<String>("name").unwrap())?;
    let limit = parse_decimal(sub.get_one::<String>("limit").unwrap().trim())?;
    let updated = store::update_card(
        conn,
        card.id,
        CardUpdate {
            name: None,
            credit_limit: Some(limit),
        },
    )?;
    println!(
        "Set limit of '{}' to {}",
        updated.name,
        updated.credit_limit.unwrap_or_default()
    );
    Ok(())
}
