// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use billfold::{cli, commands, db};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("card", sub)) => commands::cards::handle(&mut conn, sub)?,
        Some(("section", sub)) => commands::sections::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("transfer", sub)) => commands::transfers::handle(&mut conn, sub)?,
        Some(("position", sub)) => commands::positions::handle(&conn, sub)?,
        Some(("movement", sub)) => commands::movements::handle(&mut conn, sub)?,
        Some(("price", sub)) => commands::prices::handle(&conn, sub)?,
        Some(("accrual", sub)) => commands::accruals::handle(&conn, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
