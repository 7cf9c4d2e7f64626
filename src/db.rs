// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Billfold", "billfold"));

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("BILLFOLD_DB") {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("billfold.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// All money/quantity columns are exact decimal TEXT; arithmetic happens in
/// `rust_decimal`, never in SQLite's float affinity.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL CHECK(kind IN ('debit','credit')),
        currency TEXT NOT NULL,
        opening_balance TEXT,
        credit_limit TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS sections(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        initial_balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(card_id, name),
        FOREIGN KEY(card_id) REFERENCES cards(id) ON DELETE CASCADE
    );

    -- Transfer aggregate: owns exactly two transaction legs via the FK below.
    CREATE TABLE IF NOT EXISTS transfer_events(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_type TEXT NOT NULL CHECK(from_type IN ('card','cash','stock','crypto')),
        from_id INTEGER,
        to_type TEXT NOT NULL CHECK(to_type IN ('card','cash','stock','crypto')),
        to_id INTEGER,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        card_id INTEGER,
        section_id INTEGER,
        category TEXT,
        transfer_event_id INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(card_id) REFERENCES cards(id) ON DELETE CASCADE,
        FOREIGN KEY(section_id) REFERENCES sections(id) ON DELETE SET NULL,
        FOREIGN KEY(transfer_event_id) REFERENCES transfer_events(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_card ON transactions(card_id);

    CREATE TABLE IF NOT EXISTS positions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_type TEXT NOT NULL CHECK(asset_type IN ('stock','crypto')),
        symbol TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(asset_type, symbol)
    );

    CREATE TABLE IF NOT EXISTS movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        position_id INTEGER NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('buy','sell')),
        quantity TEXT NOT NULL,
        price_per_unit TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        datetime TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(position_id) REFERENCES positions(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_movements_datetime ON movements(position_id, datetime);

    CREATE TABLE IF NOT EXISTS accruals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        rate TEXT NOT NULL,
        is_fee INTEGER NOT NULL DEFAULT 0,
        payment_frequency TEXT NOT NULL,
        compound_frequency TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(card_id, name),
        FOREIGN KEY(card_id) REFERENCES cards(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        position_id INTEGER NOT NULL,
        as_of TEXT NOT NULL,
        price TEXT NOT NULL,
        source TEXT NOT NULL DEFAULT 'manual',
        UNIQUE(position_id, as_of),
        FOREIGN KEY(position_id) REFERENCES positions(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
