// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transfer engine: "move money from A to B" becomes a transfer event that
//! owns two transaction legs, written in a single SQLite transaction. The
//! legs are only ever created, read, and deleted through the event, so no
//! reader can observe half a transfer.

use crate::error::{CoreError, CoreResult};
use crate::models::{Endpoint, Transaction, TransferEvent};
use crate::money::round_money;
use crate::store;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from: Endpoint,
    pub to: Endpoint,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
}

fn resolve_endpoint(conn: &Connection, endpoint: Endpoint) -> CoreResult<()> {
    match endpoint {
        Endpoint::Cash => Ok(()),
        Endpoint::Card(id) => store::get_card(conn, id).map(|_| ()),
        Endpoint::Stock(id) | Endpoint::Crypto(id) => {
            let position = store::get_position(conn, id)?;
            if position.asset_type.as_str() != endpoint.kind() {
                return Err(CoreError::Validation(format!(
                    "position {} is a {} position, not {}",
                    id,
                    position.asset_type.as_str(),
                    endpoint.kind()
                )));
            }
            Ok(())
        }
    }
}

/// Creates the event and both legs atomically. Leg one carries `-amount` on
/// the from endpoint, leg two `+amount` on the to endpoint; card endpoints
/// attach their leg to the card, everything else books as cash.
pub fn create_transfer(conn: &mut Connection, req: TransferRequest) -> CoreResult<TransferEvent> {
    if req.amount <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "transfer amount must be positive".into(),
        ));
    }
    if req.from == req.to {
        return Err(CoreError::Validation(
            "transfer endpoints must differ".into(),
        ));
    }
    let description = req.description.trim().to_string();
    if description.is_empty() {
        return Err(CoreError::Validation("description cannot be empty".into()));
    }
    resolve_endpoint(conn, req.from)?;
    resolve_endpoint(conn, req.to)?;

    let amount = round_money(req.amount);
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO transfer_events(from_type, from_id, to_type, to_id, amount, date, description, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            req.from.kind(),
            req.from.target_id(),
            req.to.kind(),
            req.to.target_id(),
            amount.to_string(),
            req.date,
            description,
            req.category,
        ],
    )?;
    let event_id = tx.last_insert_rowid();

    let from_card = match req.from {
        Endpoint::Card(id) => Some(id),
        _ => None,
    };
    let to_card = match req.to {
        Endpoint::Card(id) => Some(id),
        _ => None,
    };
    let mut insert_leg = tx.prepare(
        "INSERT INTO transactions(date, amount, description, card_id, category, transfer_event_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    insert_leg.execute(params![
        req.date,
        (-amount).to_string(),
        format!("{} (transfer out to {})", description, req.to.kind()),
        from_card,
        req.category,
        event_id,
    ])?;
    insert_leg.execute(params![
        req.date,
        amount.to_string(),
        format!("{} (transfer in from {})", description, req.from.kind()),
        to_card,
        req.category,
        event_id,
    ])?;
    drop(insert_leg);
    tx.commit()?;

    get_transfer(conn, event_id)
}

type RawEvent = (
    i64,
    String,
    Option<i64>,
    String,
    Option<i64>,
    String,
    NaiveDate,
    String,
    Option<String>,
    String,
);

fn raw_event(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
        r.get(9)?,
    ))
}

fn map_event(raw: RawEvent) -> CoreResult<TransferEvent> {
    let (id, from_type, from_id, to_type, to_id, amount_s, date, description, category, created_at) =
        raw;
    let from = Endpoint::from_parts(&from_type, from_id).map_err(|_| {
        CoreError::Consistency(format!("transfer event {} stores an invalid from endpoint", id))
    })?;
    let to = Endpoint::from_parts(&to_type, to_id).map_err(|_| {
        CoreError::Consistency(format!("transfer event {} stores an invalid to endpoint", id))
    })?;
    let amount = Decimal::from_str_exact(&amount_s).map_err(|_| {
        CoreError::Consistency(format!(
            "invalid stored decimal '{}' for transfer amount",
            amount_s
        ))
    })?;
    Ok(TransferEvent {
        id,
        from,
        to,
        amount,
        date,
        description,
        category,
        created_at,
    })
}

const EVENT_COLUMNS: &str =
    "id, from_type, from_id, to_type, to_id, amount, date, description, category, created_at";

pub fn get_transfer(conn: &Connection, event_id: i64) -> CoreResult<TransferEvent> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM transfer_events WHERE id=?1", EVENT_COLUMNS),
            params![event_id],
            raw_event,
        )
        .optional()?;
    match raw {
        Some(raw) => map_event(raw),
        None => Err(CoreError::Reference(format!(
            "transfer {} does not exist",
            event_id
        ))),
    }
}

pub fn list_transfers(conn: &Connection) -> CoreResult<Vec<TransferEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM transfer_events ORDER BY date DESC, id DESC",
        EVENT_COLUMNS
    ))?;
    let rows = stmt.query_map([], raw_event)?;
    let mut events = Vec::new();
    for row in rows {
        events.push(map_event(row?)?);
    }
    Ok(events)
}

/// Both legs of an event, outflow first. Anything other than exactly two
/// legs is a broken pair and surfaces as a consistency failure.
pub fn transfer_legs(
    conn: &Connection,
    event_id: i64,
) -> CoreResult<(Transaction, Transaction)> {
    get_transfer(conn, event_id)?;
    let mut stmt = conn.prepare(
        "SELECT id FROM transactions WHERE transfer_event_id=?1 ORDER BY amount ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![event_id], |r| r.get::<_, i64>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    if ids.len() != 2 {
        return Err(CoreError::Consistency(format!(
            "transfer {} has {} legs, expected 2",
            event_id,
            ids.len()
        )));
    }
    Ok((
        store::get_transaction(conn, ids[0])?,
        store::get_transaction(conn, ids[1])?,
    ))
}

/// Deletes the event; the leg FK cascade removes both legs with it.
pub fn delete_transfer(conn: &mut Connection, event_id: i64) -> CoreResult<()> {
    get_transfer(conn, event_id)?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM transfer_events WHERE id=?1", params![event_id])?;
    tx.commit()?;
    Ok(())
}
