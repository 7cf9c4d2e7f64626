// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger store: CRUD for cards, sections, transactions, positions,
//! movements, accrual configs, and the manual price book.
//!
//! Balances are never stored. Every balance read folds the transaction log
//! on top of the card's opening offset, so the log cannot drift from a
//! cached figure. Transactions and movements are immutable once written;
//! an edit is a delete followed by a recreate.

use crate::error::{CoreError, CoreResult};
use crate::models::{
    AccrualConfig, AssetType, Card, CardKind, CompoundFrequency, Endpoint, Movement, MovementKind,
    PaymentFrequency, Position, PricePoint, Section, Transaction,
};
use crate::money::{money_eq_within_tolerance, round_money, round_quantity};
use crate::position;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

const FACTORY_CURRENCY: &str = "MXN";

fn decimal_field(s: &str, what: &str) -> CoreResult<Decimal> {
    Decimal::from_str_exact(s)
        .map_err(|_| CoreError::Consistency(format!("invalid stored decimal '{}' for {}", s, what)))
}

// ---------------------------------------------------------------------------
// Settings

pub fn default_currency(conn: &Connection) -> CoreResult<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='default_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| FACTORY_CURRENCY.to_string()))
}

pub fn set_default_currency(conn: &Connection, currency: &str) -> CoreResult<()> {
    let currency = currency.trim().to_uppercase();
    if currency.is_empty() {
        return Err(CoreError::Validation("currency cannot be empty".into()));
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('default_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![currency],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Cards

#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub name: String,
    pub kind: Option<CardKind>,
    pub currency: Option<String>,
    pub opening_balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub name: Option<String>,
    pub credit_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Refuse to delete a card that still has transaction history.
    #[default]
    Block,
    /// Remove the card together with its transfer events (both legs each),
    /// plain transactions, sections, and accrual configs, atomically.
    Cascade,
}

pub fn create_card(conn: &Connection, spec: NewCard) -> CoreResult<Card> {
    let name = spec.name.trim().to_string();
    if name.is_empty() {
        return Err(CoreError::Validation("card name cannot be empty".into()));
    }
    let kind = spec
        .kind
        .ok_or_else(|| CoreError::Validation("card kind is required".into()))?;
    let currency = match spec.currency {
        Some(c) => {
            let c = c.trim().to_uppercase();
            if c.is_empty() {
                return Err(CoreError::Validation("currency cannot be empty".into()));
            }
            c
        }
        None => default_currency(conn)?,
    };

    match kind {
        CardKind::Debit => {
            if spec.credit_limit.is_some() {
                return Err(CoreError::Validation(
                    "debit cards do not take a credit limit".into(),
                ));
            }
        }
        CardKind::Credit => {
            match spec.credit_limit {
                Some(limit) if limit > Decimal::ZERO => {}
                _ => {
                    return Err(CoreError::Validation(
                        "credit cards require a positive credit limit".into(),
                    ));
                }
            }
            if spec.opening_balance.is_some() {
                return Err(CoreError::Validation(
                    "credit cards do not take an opening balance".into(),
                ));
            }
        }
    }

    let exists: Option<i64> = conn
        .query_row("SELECT id FROM cards WHERE name=?1", params![name], |r| {
            r.get(0)
        })
        .optional()?;
    if exists.is_some() {
        return Err(CoreError::Validation(format!(
            "card '{}' already exists",
            name
        )));
    }

    let opening = spec
        .opening_balance
        .map(round_money)
        .unwrap_or(Decimal::ZERO);
    conn.execute(
        "INSERT INTO cards(name, kind, currency, opening_balance, credit_limit)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            name,
            kind.as_str(),
            currency,
            match kind {
                CardKind::Debit => Some(opening.to_string()),
                CardKind::Credit => None,
            },
            spec.credit_limit.map(|l| round_money(l).to_string()),
        ],
    )?;
    get_card(conn, conn.last_insert_rowid())
}

fn map_card(
    id: i64,
    name: String,
    kind_s: String,
    currency: String,
    opening_s: Option<String>,
    limit_s: Option<String>,
    created_at: String,
    updated_at: String,
) -> CoreResult<Card> {
    let kind = CardKind::from_str(&kind_s)
        .map_err(|_| CoreError::Consistency(format!("unknown stored card kind '{}'", kind_s)))?;
    let opening_balance = opening_s
        .map(|s| decimal_field(&s, "card opening balance"))
        .transpose()?;
    let credit_limit = limit_s
        .map(|s| decimal_field(&s, "card credit limit"))
        .transpose()?;
    Ok(Card {
        id,
        name,
        kind,
        currency,
        opening_balance,
        credit_limit,
        created_at,
        updated_at,
    })
}

const CARD_COLUMNS: &str =
    "id, name, kind, currency, opening_balance, credit_limit, created_at, updated_at";

pub fn get_card(conn: &Connection, id: i64) -> CoreResult<Card> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM cards WHERE id=?1", CARD_COLUMNS),
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, Option<String>>(5)?,
                    r.get::<_, String>(6)?,
                    r.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?;
    let (id, name, kind, ccy, opening, limit, created, updated) =
        row.ok_or_else(|| CoreError::Reference(format!("card {} does not exist", id)))?;
    map_card(id, name, kind, ccy, opening, limit, created, updated)
}

pub fn get_card_by_name(conn: &Connection, name: &str) -> CoreResult<Card> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM cards WHERE name=?1",
            params![name.trim()],
            |r| r.get(0),
        )
        .optional()?;
    match id {
        Some(id) => get_card(conn, id),
        None => Err(CoreError::Reference(format!(
            "card '{}' does not exist",
            name.trim()
        ))),
    }
}

pub fn list_cards(conn: &Connection) -> CoreResult<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards ORDER BY created_at DESC, id DESC",
        CARD_COLUMNS
    ))?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, String>(7)?,
        ))
    })?;
    let mut cards = Vec::new();
    for row in rows {
        let (id, name, kind, ccy, opening, limit, created, updated) = row?;
        cards.push(map_card(id, name, kind, ccy, opening, limit, created, updated)?);
    }
    Ok(cards)
}

pub fn update_card(conn: &Connection, id: i64, update: CardUpdate) -> CoreResult<Card> {
    let card = get_card(conn, id)?;
    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::Validation("card name cannot be empty".into()));
        }
        let clash: Option<i64> = conn
            .query_row(
                "SELECT id FROM cards WHERE name=?1 AND id<>?2",
                params![name, id],
                |r| r.get(0),
            )
            .optional()?;
        if clash.is_some() {
            return Err(CoreError::Validation(format!(
                "card '{}' already exists",
                name
            )));
        }
        conn.execute(
            "UPDATE cards SET name=?1, updated_at=datetime('now') WHERE id=?2",
            params![name, id],
        )?;
    }
    if let Some(limit) = update.credit_limit {
        if card.kind != CardKind::Credit {
            return Err(CoreError::Validation(
                "only credit cards have a credit limit".into(),
            ));
        }
        if limit <= Decimal::ZERO {
            return Err(CoreError::Validation(
                "credit limit must be positive".into(),
            ));
        }
        conn.execute(
            "UPDATE cards SET credit_limit=?1, updated_at=datetime('now') WHERE id=?2",
            params![round_money(limit).to_string(), id],
        )?;
    }
    get_card(conn, id)
}

pub fn delete_card(conn: &mut Connection, id: i64, policy: DeletePolicy) -> CoreResult<()> {
    get_card(conn, id)?;
    let history: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions t
         LEFT JOIN transfer_events e ON t.transfer_event_id=e.id
         WHERE t.card_id=?1
            OR (e.from_type='card' AND e.from_id=?1)
            OR (e.to_type='card' AND e.to_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if policy == DeletePolicy::Block && history > 0 {
        return Err(CoreError::Validation(format!(
            "card {} has {} transactions; pass the cascade policy to delete anyway",
            id, history
        )));
    }

    let tx = conn.transaction()?;
    // Events touching this card own legs on both sides; deleting the event
    // cascades to both of them.
    tx.execute(
        "DELETE FROM transfer_events
         WHERE (from_type='card' AND from_id=?1) OR (to_type='card' AND to_id=?1)",
        params![id],
    )?;
    // Plain transactions, sections, and accrual configs go with the card FK.
    tx.execute("DELETE FROM cards WHERE id=?1", params![id])?;
    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Sections

#[derive(Debug, Clone)]
pub struct NewSection {
    pub card_id: i64,
    pub name: String,
    pub initial_balance: Option<Decimal>,
}

pub fn create_section(conn: &Connection, spec: NewSection) -> CoreResult<Section> {
    get_card(conn, spec.card_id)?;
    let name = spec.name.trim().to_string();
    if name.is_empty() {
        return Err(CoreError::Validation("section name cannot be empty".into()));
    }
    let clash: Option<i64> = conn
        .query_row(
            "SELECT id FROM sections WHERE card_id=?1 AND name=?2",
            params![spec.card_id, name],
            |r| r.get(0),
        )
        .optional()?;
    if clash.is_some() {
        return Err(CoreError::Validation(format!(
            "section '{}' already exists on card {}",
            name, spec.card_id
        )));
    }
    let initial = spec
        .initial_balance
        .map(round_money)
        .unwrap_or(Decimal::ZERO);
    conn.execute(
        "INSERT INTO sections(card_id, name, initial_balance) VALUES (?1, ?2, ?3)",
        params![spec.card_id, name, initial.to_string()],
    )?;
    get_section(conn, conn.last_insert_rowid())
}

pub fn get_section(conn: &Connection, id: i64) -> CoreResult<Section> {
    let row = conn
        .query_row(
            "SELECT id, card_id, name, initial_balance, created_at FROM sections WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;
    let (id, card_id, name, initial_s, created_at) =
        row.ok_or_else(|| CoreError::Reference(format!("section {} does not exist", id)))?;
    Ok(Section {
        id,
        card_id,
        name,
        initial_balance: decimal_field(&initial_s, "section initial balance")?,
        created_at,
    })
}

pub fn list_sections(conn: &Connection, card_id: i64) -> CoreResult<Vec<Section>> {
    get_card(conn, card_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, card_id, name, initial_balance, created_at
         FROM sections WHERE card_id=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![card_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;
    let mut sections = Vec::new();
    for row in rows {
        let (id, card_id, name, initial_s, created_at) = row?;
        sections.push(Section {
            id,
            card_id,
            name,
            initial_balance: decimal_field(&initial_s, "section initial balance")?,
            created_at,
        });
    }
    Ok(sections)
}

pub fn delete_section(conn: &Connection, id: i64) -> CoreResult<()> {
    get_section(conn, id)?;
    // Transactions that referenced the section stay on the card (FK sets
    // their section to NULL).
    conn.execute("DELETE FROM sections WHERE id=?1", params![id])?;
    Ok(())
}

pub fn section_balance(conn: &Connection, id: i64) -> CoreResult<Decimal> {
    let section = get_section(conn, id)?;
    let sum = sum_amounts(
        conn,
        "SELECT amount FROM transactions WHERE section_id=?1",
        params![id],
    )?;
    Ok(section.initial_balance + sum)
}

// ---------------------------------------------------------------------------
// Transactions

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub card_id: Option<i64>,
    pub section_id: Option<i64>,
    pub category: Option<String>,
}

/// Plain (non-transfer) transaction insert. Transfer legs can only be
/// produced by the transfer engine, so there is no way to hand-craft half a
/// pair through this path.
pub fn create_transaction(conn: &Connection, spec: NewTransaction) -> CoreResult<Transaction> {
    let description = spec.description.trim().to_string();
    if description.is_empty() {
        return Err(CoreError::Validation("description cannot be empty".into()));
    }
    if spec.amount.is_zero() {
        return Err(CoreError::Validation("amount cannot be zero".into()));
    }
    if let Some(card_id) = spec.card_id {
        get_card(conn, card_id)?;
    }
    if let Some(section_id) = spec.section_id {
        let section = get_section(conn, section_id)?;
        match spec.card_id {
            Some(card_id) if card_id == section.card_id => {}
            _ => {
                return Err(CoreError::Validation(format!(
                    "section {} belongs to card {}, not the transaction's card",
                    section_id, section.card_id
                )));
            }
        }
    }
    conn.execute(
        "INSERT INTO transactions(date, amount, description, card_id, section_id, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            spec.date,
            round_money(spec.amount).to_string(),
            description,
            spec.card_id,
            spec.section_id,
            spec.category,
        ],
    )?;
    get_transaction(conn, conn.last_insert_rowid())
}

const TRANSACTION_SELECT: &str = "SELECT t.id, t.date, t.amount, t.description, t.card_id, t.section_id, t.category,
            t.transfer_event_id, e.from_type, e.from_id, e.to_type, e.to_id, t.created_at
     FROM transactions t
     LEFT JOIN transfer_events e ON t.transfer_event_id=e.id";

type RawTransaction = (
    i64,
    NaiveDate,
    String,
    String,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<i64>,
    Option<String>,
    Option<i64>,
    Option<String>,
    Option<i64>,
    String,
);

fn raw_transaction(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawTransaction> {
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
        r.get(10)?,
        r.get(11)?,
        r.get(12)?,
    ))
}

fn map_transaction(raw: RawTransaction) -> CoreResult<Transaction> {
    let (
        id,
        date,
        amount_s,
        description,
        card_id,
        section_id,
        category,
        transfer_event_id,
        from_type,
        from_id,
        to_type,
        to_id,
        created_at,
    ) = raw;
    let (transfer_from, transfer_to) = match (&transfer_event_id, from_type, to_type) {
        (Some(event_id), Some(ft), Some(tt)) => {
            let from = Endpoint::from_parts(&ft, from_id).map_err(|_| {
                CoreError::Consistency(format!(
                    "transfer event {} stores an invalid from endpoint",
                    event_id
                ))
            })?;
            let to = Endpoint::from_parts(&tt, to_id).map_err(|_| {
                CoreError::Consistency(format!(
                    "transfer event {} stores an invalid to endpoint",
                    event_id
                ))
            })?;
            (Some(from), Some(to))
        }
        (Some(event_id), _, _) => {
            return Err(CoreError::Consistency(format!(
                "transaction {} points at missing transfer event {}",
                id, event_id
            )));
        }
        _ => (None, None),
    };
    Ok(Transaction {
        id,
        date,
        amount: decimal_field(&amount_s, "transaction amount")?,
        description,
        card_id,
        section_id,
        category,
        is_internal_transfer: transfer_event_id.is_some(),
        transfer_event_id,
        transfer_from,
        transfer_to,
        created_at,
    })
}

pub fn get_transaction(conn: &Connection, id: i64) -> CoreResult<Transaction> {
    let raw = conn
        .query_row(
            &format!("{} WHERE t.id=?1", TRANSACTION_SELECT),
            params![id],
            raw_transaction,
        )
        .optional()?;
    match raw {
        Some(raw) => map_transaction(raw),
        None => Err(CoreError::Reference(format!(
            "transaction {} does not exist",
            id
        ))),
    }
}

/// Deleting a transfer leg removes the whole pair: the leg resolves to its
/// owning event and the event's FK cascade takes both legs down atomically.
pub fn delete_transaction(conn: &mut Connection, id: i64) -> CoreResult<()> {
    let t = get_transaction(conn, id)?;
    let tx = conn.transaction()?;
    match t.transfer_event_id {
        Some(event_id) => {
            tx.execute("DELETE FROM transfer_events WHERE id=?1", params![event_id])?;
        }
        None => {
            tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub card_id: Option<i64>,
    pub cash_only: bool,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_transfers: bool,
    pub page: u64,
    pub per_page: u64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        TransactionFilter {
            card_id: None,
            cash_only: false,
            category: None,
            from: None,
            to: None,
            include_transfers: true,
            page: 1,
            per_page: 50,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub has_next: bool,
}

/// Filtered, paginated listing with stable ordering: date descending, id
/// descending as tie-break, so pagination is deterministic.
pub fn list_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> CoreResult<TransactionPage> {
    if filter.page == 0 || filter.per_page == 0 {
        return Err(CoreError::Validation(
            "page and per-page must be positive".into(),
        ));
    }
    let mut clauses = String::from(" WHERE 1=1");
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(card_id) = filter.card_id {
        clauses.push_str(" AND t.card_id=?");
        params_vec.push(card_id.to_string());
    }
    if filter.cash_only {
        clauses.push_str(" AND t.card_id IS NULL");
    }
    if let Some(ref category) = filter.category {
        clauses.push_str(" AND t.category=?");
        params_vec.push(category.clone());
    }
    if let Some(from) = filter.from {
        clauses.push_str(" AND t.date>=?");
        params_vec.push(from.to_string());
    }
    if let Some(to) = filter.to {
        clauses.push_str(" AND t.date<=?");
        params_vec.push(to.to_string());
    }
    if !filter.include_transfers {
        clauses.push_str(" AND t.transfer_event_id IS NULL");
    }

    let count_sql = format!("SELECT COUNT(*) FROM transactions t{}", clauses);
    let total: i64 = conn.query_row(
        &count_sql,
        rusqlite::params_from_iter(params_vec.iter()),
        |r| r.get(0),
    )?;
    let total = total as u64;

    let offset = (filter.page - 1) * filter.per_page;
    let sql = format!(
        "{}{} ORDER BY t.date DESC, t.id DESC LIMIT ? OFFSET ?",
        TRANSACTION_SELECT, clauses
    );
    params_vec.push(filter.per_page.to_string());
    params_vec.push(offset.to_string());

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), raw_transaction)?;
    let mut items = Vec::new();
    for row in rows {
        items.push(map_transaction(row?)?);
    }
    Ok(TransactionPage {
        has_next: offset + (items.len() as u64) < total,
        items,
        total,
        page: filter.page,
        per_page: filter.per_page,
    })
}

// ---------------------------------------------------------------------------
// Derived balances

fn sum_amounts<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> CoreResult<Decimal> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |r| r.get::<_, String>(0))?;
    let mut sum = Decimal::ZERO;
    for row in rows {
        sum += decimal_field(&row?, "transaction amount")?;
    }
    Ok(sum)
}

/// Current balance of a debit card: opening offset plus the full transaction
/// log. The only way to read a balance; nothing ever writes one.
pub fn card_balance(conn: &Connection, card_id: i64) -> CoreResult<Decimal> {
    let card = get_card(conn, card_id)?;
    if card.kind != CardKind::Debit {
        return Err(CoreError::Validation(format!(
            "card {} is a credit card; use its used/available credit",
            card_id
        )));
    }
    let sum = sum_amounts(
        conn,
        "SELECT amount FROM transactions WHERE card_id=?1",
        params![card_id],
    )?;
    Ok(card.opening_balance.unwrap_or(Decimal::ZERO) + sum)
}

/// Used credit of a credit card: charges are negative amounts, so the used
/// figure is the negated sum of the log.
pub fn card_used_credit(conn: &Connection, card_id: i64) -> CoreResult<Decimal> {
    let card = get_card(conn, card_id)?;
    if card.kind != CardKind::Credit {
        return Err(CoreError::Validation(format!(
            "card {} is a debit card; use its balance",
            card_id
        )));
    }
    let sum = sum_amounts(
        conn,
        "SELECT amount FROM transactions WHERE card_id=?1",
        params![card_id],
    )?;
    Ok(-sum)
}

pub fn card_available_credit(conn: &Connection, card_id: i64) -> CoreResult<Decimal> {
    let card = get_card(conn, card_id)?;
    let limit = card.credit_limit.ok_or_else(|| {
        CoreError::Validation(format!("card {} is a debit card; it has no limit", card_id))
    })?;
    Ok(limit - card_used_credit(conn, card_id)?)
}

/// Balance of a card as of an inclusive date, used by the trend charts.
pub fn card_balance_as_of(conn: &Connection, card: &Card, as_of: NaiveDate) -> CoreResult<Decimal> {
    let sum = sum_amounts(
        conn,
        "SELECT amount FROM transactions WHERE card_id=?1 AND date<=?2",
        params![card.id, as_of],
    )?;
    Ok(card.opening_balance.unwrap_or(Decimal::ZERO) + sum)
}

// ---------------------------------------------------------------------------
// Positions and movements

#[derive(Debug, Clone)]
pub struct NewPosition {
    pub asset_type: AssetType,
    pub symbol: String,
}

pub fn create_position(conn: &Connection, spec: NewPosition) -> CoreResult<Position> {
    let symbol = spec.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(CoreError::Validation("symbol cannot be empty".into()));
    }
    let clash: Option<i64> = conn
        .query_row(
            "SELECT id FROM positions WHERE asset_type=?1 AND symbol=?2",
            params![spec.asset_type.as_str(), symbol],
            |r| r.get(0),
        )
        .optional()?;
    if clash.is_some() {
        return Err(CoreError::Validation(format!(
            "position {} {} already exists",
            spec.asset_type.as_str(),
            symbol
        )));
    }
    conn.execute(
        "INSERT INTO positions(asset_type, symbol) VALUES (?1, ?2)",
        params![spec.asset_type.as_str(), symbol],
    )?;
    get_position(conn, conn.last_insert_rowid())
}

fn map_position(
    id: i64,
    asset_type_s: String,
    symbol: String,
    created_at: String,
) -> CoreResult<Position> {
    let asset_type = AssetType::from_str(&asset_type_s).map_err(|_| {
        CoreError::Consistency(format!("unknown stored asset type '{}'", asset_type_s))
    })?;
    Ok(Position {
        id,
        asset_type,
        symbol,
        created_at,
    })
}

pub fn get_position(conn: &Connection, id: i64) -> CoreResult<Position> {
    let row = conn
        .query_row(
            "SELECT id, asset_type, symbol, created_at FROM positions WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let (id, at, symbol, created_at) =
        row.ok_or_else(|| CoreError::Reference(format!("position {} does not exist", id)))?;
    map_position(id, at, symbol, created_at)
}

pub fn get_position_by_symbol(
    conn: &Connection,
    asset_type: AssetType,
    symbol: &str,
) -> CoreResult<Position> {
    let symbol = symbol.trim().to_uppercase();
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM positions WHERE asset_type=?1 AND symbol=?2",
            params![asset_type.as_str(), symbol],
            |r| r.get(0),
        )
        .optional()?;
    match id {
        Some(id) => get_position(conn, id),
        None => Err(CoreError::Reference(format!(
            "position {} {} does not exist",
            asset_type.as_str(),
            symbol
        ))),
    }
}

pub fn list_positions(conn: &Connection) -> CoreResult<Vec<Position>> {
    let mut stmt = conn.prepare(
        "SELECT id, asset_type, symbol, created_at FROM positions ORDER BY asset_type, symbol",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut positions = Vec::new();
    for row in rows {
        let (id, at, symbol, created_at) = row?;
        positions.push(map_position(id, at, symbol, created_at)?);
    }
    Ok(positions)
}

pub fn delete_position(conn: &Connection, id: i64) -> CoreResult<()> {
    get_position(conn, id)?;
    // Movements and price points cascade with the position.
    conn.execute("DELETE FROM positions WHERE id=?1", params![id])?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewMovement {
    pub position_id: i64,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    /// Optional caller-supplied total, checked against quantity × price
    /// within the rounding tolerance and rejected on mismatch.
    pub total_amount: Option<Decimal>,
    pub datetime: NaiveDateTime,
    pub description: Option<String>,
}

/// Appends a movement after replaying the would-be log inside the insert
/// transaction. A sell that would drive holdings negative rolls back and
/// leaves the stored log untouched.
pub fn create_movement(conn: &mut Connection, spec: NewMovement) -> CoreResult<Movement> {
    get_position(conn, spec.position_id)?;
    if spec.quantity <= Decimal::ZERO {
        return Err(CoreError::Validation("quantity must be positive".into()));
    }
    if spec.price_per_unit <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "price per unit must be positive".into(),
        ));
    }
    let quantity = round_quantity(spec.quantity);
    let price = round_money(spec.price_per_unit);
    let expected_total = round_money(quantity * price);
    if let Some(total) = spec.total_amount {
        if !money_eq_within_tolerance(total, expected_total) {
            return Err(CoreError::Consistency(format!(
                "total amount {} does not match quantity x price ({})",
                total, expected_total
            )));
        }
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO movements(position_id, kind, quantity, price_per_unit, total_amount, datetime, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            spec.position_id,
            spec.kind.as_str(),
            quantity.to_string(),
            price.to_string(),
            expected_total.to_string(),
            spec.datetime,
            spec.description,
        ],
    )?;
    let id = tx.last_insert_rowid();
    let log = load_movements(&tx, spec.position_id)?;
    position::replay(&log)?;
    tx.commit()?;
    get_movement(conn, id)
}

fn map_movement(raw: RawMovement) -> CoreResult<Movement> {
    let (id, position_id, kind_s, qty_s, price_s, total_s, datetime, description, created_at) = raw;
    let kind = MovementKind::from_str(&kind_s).map_err(|_| {
        CoreError::Consistency(format!("unknown stored movement kind '{}'", kind_s))
    })?;
    Ok(Movement {
        id,
        position_id,
        kind,
        quantity: decimal_field(&qty_s, "movement quantity")?,
        price_per_unit: decimal_field(&price_s, "movement price")?,
        total_amount: decimal_field(&total_s, "movement total")?,
        datetime,
        description,
        created_at,
    })
}

type RawMovement = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    NaiveDateTime,
    Option<String>,
    String,
);

fn raw_movement(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawMovement> {
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
    ))
}

const MOVEMENT_COLUMNS: &str =
    "id, position_id, kind, quantity, price_per_unit, total_amount, datetime, description, created_at";

fn load_movements(conn: &Connection, position_id: i64) -> CoreResult<Vec<Movement>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM movements WHERE position_id=?1 ORDER BY datetime ASC, id ASC",
        MOVEMENT_COLUMNS
    ))?;
    let rows = stmt.query_map(params![position_id], raw_movement)?;
    let mut movements = Vec::new();
    for row in rows {
        movements.push(map_movement(row?)?);
    }
    Ok(movements)
}

pub fn get_movement(conn: &Connection, id: i64) -> CoreResult<Movement> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM movements WHERE id=?1", MOVEMENT_COLUMNS),
            params![id],
            raw_movement,
        )
        .optional()?;
    match raw {
        Some(raw) => map_movement(raw),
        None => Err(CoreError::Reference(format!(
            "movement {} does not exist",
            id
        ))),
    }
}

pub fn list_movements(conn: &Connection, position_id: i64) -> CoreResult<Vec<Movement>> {
    get_position(conn, position_id)?;
    load_movements(conn, position_id)
}

/// Removes a movement only when the remaining log still replays without
/// negative holdings; otherwise rolls back.
pub fn delete_movement(conn: &mut Connection, id: i64) -> CoreResult<()> {
    let movement = get_movement(conn, id)?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM movements WHERE id=?1", params![id])?;
    let log = load_movements(&tx, movement.position_id)?;
    position::replay(&log)?;
    tx.commit()?;
    Ok(())
}

/// Current holdings for a position, replayed from its stored log.
pub fn position_holdings(conn: &Connection, position_id: i64) -> CoreResult<position::Holdings> {
    let log = list_movements(conn, position_id)?;
    position::replay(&log)
}

// ---------------------------------------------------------------------------
// Accrual configs

#[derive(Debug, Clone)]
pub struct NewAccrual {
    pub card_id: i64,
    pub name: String,
    pub rate: Decimal,
    pub is_fee: bool,
    /// `None` falls back to annually; an invalid string never reaches this
    /// type because parsing already rejected it.
    pub payment_frequency: Option<PaymentFrequency>,
    /// `None` falls back to daily_365.
    pub compound_frequency: Option<CompoundFrequency>,
}

pub fn create_accrual(conn: &Connection, spec: NewAccrual) -> CoreResult<AccrualConfig> {
    get_card(conn, spec.card_id)?;
    let name = spec.name.trim().to_string();
    if name.is_empty() {
        return Err(CoreError::Validation("accrual name cannot be empty".into()));
    }
    if spec.rate < Decimal::ZERO {
        return Err(CoreError::Validation(
            "rate must be non-negative (use the fee flag for charges)".into(),
        ));
    }
    let clash: Option<i64> = conn
        .query_row(
            "SELECT id FROM accruals WHERE card_id=?1 AND name=?2",
            params![spec.card_id, name],
            |r| r.get(0),
        )
        .optional()?;
    if clash.is_some() {
        return Err(CoreError::Validation(format!(
            "accrual '{}' already exists on card {}",
            name, spec.card_id
        )));
    }
    let payment = spec.payment_frequency.unwrap_or(PaymentFrequency::Annually);
    let compound = spec.compound_frequency.unwrap_or(CompoundFrequency::Daily365);
    conn.execute(
        "INSERT INTO accruals(card_id, name, rate, is_fee, payment_frequency, compound_frequency)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            spec.card_id,
            name,
            spec.rate.to_string(),
            spec.is_fee,
            payment.as_str(),
            compound.as_str(),
        ],
    )?;
    get_accrual(conn, conn.last_insert_rowid())
}

type RawAccrual = (
    i64,
    i64,
    String,
    String,
    bool,
    String,
    String,
    bool,
    String,
);

fn raw_accrual(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawAccrual> {
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
    ))
}

fn map_accrual(raw: RawAccrual) -> CoreResult<AccrualConfig> {
    let (id, card_id, name, rate_s, is_fee, payment_s, compound_s, is_active, created_at) = raw;
    Ok(AccrualConfig {
        id,
        card_id,
        name,
        rate: decimal_field(&rate_s, "accrual rate")?,
        is_fee,
        payment_frequency: PaymentFrequency::from_str(&payment_s).map_err(|_| {
            CoreError::Consistency(format!("unknown stored payment frequency '{}'", payment_s))
        })?,
        compound_frequency: CompoundFrequency::from_str(&compound_s).map_err(|_| {
            CoreError::Consistency(format!("unknown stored compound frequency '{}'", compound_s))
        })?,
        is_active,
        created_at,
    })
}

const ACCRUAL_COLUMNS: &str = "id, card_id, name, rate, is_fee, payment_frequency, compound_frequency, is_active, created_at";

pub fn get_accrual(conn: &Connection, id: i64) -> CoreResult<AccrualConfig> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM accruals WHERE id=?1", ACCRUAL_COLUMNS),
            params![id],
            raw_accrual,
        )
        .optional()?;
    match raw {
        Some(raw) => map_accrual(raw),
        None => Err(CoreError::Reference(format!(
            "accrual {} does not exist",
            id
        ))),
    }
}

pub fn list_accruals(conn: &Connection, card_id: i64) -> CoreResult<Vec<AccrualConfig>> {
    get_card(conn, card_id)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accruals WHERE card_id=?1 ORDER BY created_at ASC, id ASC",
        ACCRUAL_COLUMNS
    ))?;
    let rows = stmt.query_map(params![card_id], raw_accrual)?;
    let mut accruals = Vec::new();
    for row in rows {
        accruals.push(map_accrual(row?)?);
    }
    Ok(accruals)
}

pub fn set_accrual_active(conn: &Connection, id: i64, active: bool) -> CoreResult<AccrualConfig> {
    get_accrual(conn, id)?;
    conn.execute(
        "UPDATE accruals SET is_active=?1 WHERE id=?2",
        params![active, id],
    )?;
    get_accrual(conn, id)
}

pub fn delete_accrual(conn: &Connection, id: i64) -> CoreResult<()> {
    get_accrual(conn, id)?;
    conn.execute("DELETE FROM accruals WHERE id=?1", params![id])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Price book

pub fn set_price(
    conn: &Connection,
    position_id: i64,
    as_of: NaiveDateTime,
    price: Decimal,
    source: &str,
) -> CoreResult<PricePoint> {
    get_position(conn, position_id)?;
    if price <= Decimal::ZERO {
        return Err(CoreError::Validation("price must be positive".into()));
    }
    conn.execute(
        "INSERT INTO prices(position_id, as_of, price, source) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(position_id, as_of) DO UPDATE SET price=excluded.price, source=excluded.source",
        params![position_id, as_of, round_money(price).to_string(), source],
    )?;
    let raw = conn.query_row(
        "SELECT id, position_id, as_of, price, source FROM prices WHERE position_id=?1 AND as_of=?2",
        params![position_id, as_of],
        |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, NaiveDateTime>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
            ))
        },
    )?;
    let (id, position_id, as_of, price_s, source) = raw;
    Ok(PricePoint {
        id,
        position_id,
        as_of,
        price: decimal_field(&price_s, "price point")?,
        source,
    })
}

pub fn list_prices(conn: &Connection, limit: usize) -> CoreResult<Vec<(String, PricePoint)>> {
    let mut stmt = conn.prepare(
        "SELECT pos.symbol, p.id, p.position_id, p.as_of, p.price, p.source
         FROM prices p JOIN positions pos ON p.position_id=pos.id
         ORDER BY p.as_of DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, i64>(2)?,
            r.get::<_, NaiveDateTime>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (symbol, id, position_id, as_of, price_s, source) = row?;
        out.push((
            symbol,
            PricePoint {
                id,
                position_id,
                as_of,
                price: decimal_field(&price_s, "price point")?,
                source,
            },
        ));
    }
    Ok(out)
}

/// Latest stored price per position, keyed by position id.
pub fn latest_prices(conn: &Connection) -> CoreResult<HashMap<i64, Decimal>> {
    let mut stmt = conn.prepare(
        "SELECT position_id, price FROM (
             SELECT position_id,
                    price,
                    ROW_NUMBER() OVER (
                        PARTITION BY position_id
                        ORDER BY as_of DESC, rowid DESC
                    ) AS rn
             FROM prices
         ) WHERE rn = 1",
    )?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = HashMap::new();
    for row in rows {
        let (position_id, price_s) = row?;
        out.insert(position_id, decimal_field(&price_s, "price point")?);
    }
    Ok(out)
}
