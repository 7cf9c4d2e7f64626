// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::accrual;
use crate::store::{self, NewAccrual};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            store::delete_accrual(conn, id)?;
            println!("Removed accrual {}", id);
        }
        Some(("toggle", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let accrual = store::set_accrual_active(conn, id, !sub.get_flag("off"))?;
            println!(
                "Accrual '{}' is now {}",
                accrual.name,
                if accrual.is_active { "active" } else { "inactive" }
            );
        }
        Some(("compute", sub)) => compute(conn, sub)?,
        Some(("projection", sub)) => projection(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card = store::get_card_by_name(conn, sub.get_one::<String>("card").unwrap())?;
    let accrual = store::create_accrual(
        conn,
        NewAccrual {
            card_id: card.id,
            name: sub.get_one::<String>("name").unwrap().clone(),
            rate: parse_decimal(sub.get_one::<String>("rate").unwrap().trim())?,
            is_fee: sub.get_flag("fee"),
            payment_frequency: sub
                .get_one::<String>("payment")
                .map(|s| s.trim().parse())
                .transpose()?,
            compound_frequency: sub
                .get_one::<String>("compound")
                .map(|s| s.trim().parse())
                .transpose()?,
        },
    )?;
    println!(
        "Added {} '{}' at {}% on card '{}'",
        if accrual.is_fee { "fee" } else { "interest" },
        accrual.name,
        accrual.rate,
        card.name
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card = store::get_card_by_name(conn, sub.get_one::<String>("card").unwrap())?;
    let rows = store::list_accruals(conn, card.id)?
        .into_iter()
        .map(|a| {
            let ear = accrual::effective_annual_rate(a.rate, a.compound_frequency)
                .map(|e| e.to_string())
                .unwrap_or_default();
            vec![
                a.id.to_string(),
                a.name,
                if a.is_fee { "fee".into() } else { "interest".into() },
                format!("{}%", a.rate),
                a.payment_frequency.as_str().to_string(),
                a.compound_frequency.as_str().to_string(),
                format!("{}%", ear),
                if a.is_active { "yes".into() } else { "no".into() },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Name", "Kind", "Rate", "Payment", "Compound", "EAR", "Active"],
            rows,
        )
    );
    Ok(())
}

fn compute(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let config = store::get_accrual(conn, *sub.get_one::<i64>("id").unwrap())?;
    let principal = parse_decimal(sub.get_one::<String>("principal").unwrap().trim())?;
    let days = *sub.get_one::<i64>("days").unwrap();
    let amount = accrual::accrued_amount(
        principal,
        config.rate,
        config.is_fee,
        config.compound_frequency,
        days,
    )?;
    println!(
        "'{}' on {} over {} days: {}",
        config.name, principal, days, amount
    );
    Ok(())
}

fn projection(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let card = store::get_card_by_name(conn, sub.get_one::<String>("card").unwrap())?;
    let projection = accrual::card_projection(
        conn,
        card.id,
        parse_decimal(sub.get_one::<String>("principal").unwrap().trim())?,
        sub.get_one::<u32>("months").copied().unwrap_or(12),
    )?;
    if maybe_print_json(sub.get_flag("json"), false, &projection)? {
        return Ok(());
    }
    let rows = projection
        .breakdown
        .iter()
        .map(|line| {
            vec![
                line.name.clone(),
                line.kind.to_string(),
                format!("{}%", line.rate),
                line.compound_frequency.clone(),
                line.amount.to_string(),
                format!("{}%", line.effective_annual_rate),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Name", "Kind", "Rate", "Compound", "Amount", "EAR"], rows)
    );
    println!(
        "principal {} over {} months: interest {}, fees {}, final {}",
        projection.principal,
        projection.months,
        projection.total_interest,
        projection.total_fees,
        projection.final_amount
    );
    Ok(())
}
