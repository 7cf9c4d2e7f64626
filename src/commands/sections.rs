// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{self, NewSection};
use crate::utils::{parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let card = store::get_card_by_name(conn, sub.get_one::<String>("card").unwrap())?;
            let section = store::create_section(
                conn,
                NewSection {
                    card_id: card.id,
                    name: sub.get_one::<String>("name").unwrap().clone(),
                    initial_balance: sub
                        .get_one::<String>("initial-balance")
                        .map(|s| parse_decimal(s.trim()))
                        .transpose()?,
                },
            )?;
            println!("Added section '{}' on card '{}'", section.name, card.name);
        }
        Some(("list", sub)) => {
            let card = store::get_card_by_name(conn, sub.get_one::<String>("card").unwrap())?;
            let mut rows = Vec::new();
            for section in store::list_sections(conn, card.id)? {
                let balance = store::section_balance(conn, section.id)?;
                rows.push(vec![
                    section.name,
                    section.initial_balance.to_string(),
                    balance.to_string(),
                    section.created_at,
                ]);
            }
            println!(
                "{}",
                pretty_table(&["Section", "Initial", "Balance", "Created"], rows)
            );
        }
        Some(("rm", sub)) => {
            let card = store::get_card_by_name(conn, sub.get_one::<String>("card").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let section = store::list_sections(conn, card.id)?
                .into_iter()
                .find(|s| s.name == name.trim())
                .ok_or_else(|| {
                    anyhow::anyhow!("Section '{}' not found on card '{}'", name, card.name)
                })?;
            store::delete_section(conn, section.id)?;
            println!("Removed section '{}' from card '{}'", section.name, card.name);
        }
        _ => {}
    }
    Ok(())
}
