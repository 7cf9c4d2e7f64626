// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-currency", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap();
            store::set_default_currency(conn, ccy)?;
            println!("Default currency set to {}", ccy.trim().to_uppercase());
        }
        Some(("show", _)) => {
            println!("default currency: {}", store::default_currency(conn)?);
        }
        _ => {}
    }
    Ok(())
}
