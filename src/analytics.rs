// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Analytics aggregator: read-only dashboard reports over calendar windows.
//! Periods are calendar spans containing a supplied `today` (ISO week,
//! calendar month/quarter/year), never rolling windows, and every query
//! takes the reference date as a parameter rather than reading a clock.

use crate::error::{CoreError, CoreResult};
use crate::models::CardKind;
use crate::money::round_money;
use crate::store;
use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Inclusive calendar span containing `today`. Weeks run Monday to
    /// Sunday.
    pub fn span(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Period::Week => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (start, start + Duration::days(6))
            }
            Period::Month => {
                let start = today.with_day(1).unwrap();
                (start, month_end(start))
            }
            Period::Quarter => {
                let quarter_start_month = ((today.month() - 1) / 3) * 3 + 1;
                let start = NaiveDate::from_ymd_opt(today.year(), quarter_start_month, 1).unwrap();
                let last_month =
                    NaiveDate::from_ymd_opt(today.year(), quarter_start_month + 2, 1).unwrap();
                (start, month_end(last_month))
            }
            Period::Year => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap(),
            ),
        }
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            other => Err(CoreError::Validation(format!(
                "unknown period '{}', expected week|month|quarter|year",
                other
            ))),
        }
    }
}

fn month_end(any_day_in_month: NaiveDate) -> NaiveDate {
    let (year, month) = (any_day_in_month.year(), any_day_in_month.month());
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    };
    next_month_start - Duration::days(1)
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyAmount {
    pub currency: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub period: Period,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Card balances per currency: debit balances minus credit card debt.
    /// Currencies are never summed across; conversion is out of scope.
    pub balances: Vec<CurrencyAmount>,
    pub available_credit: Vec<CurrencyAmount>,
    pub total_investment_value: Decimal,
    pub investment_cost_basis: Decimal,
    pub unrealized_pl: Decimal,
    pub period_income: Decimal,
    /// Kept negative, the way the ledger stores outflows.
    pub period_expenses: Decimal,
    pub period_net: Decimal,
}

pub fn dashboard_summary(
    conn: &Connection,
    period: Period,
    today: NaiveDate,
) -> CoreResult<DashboardSummary> {
    let (start, end) = period.span(today);

    let mut balances: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut available: BTreeMap<String, Decimal> = BTreeMap::new();
    for card in store::list_cards(conn)? {
        match card.kind {
            CardKind::Debit => {
                *balances.entry(card.currency.clone()).or_default() +=
                    store::card_balance(conn, card.id)?;
            }
            CardKind::Credit => {
                let used = store::card_used_credit(conn, card.id)?;
                *balances.entry(card.currency.clone()).or_default() -= used;
                let limit = card.credit_limit.unwrap_or(Decimal::ZERO);
                *available.entry(card.currency).or_default() += limit - used;
            }
        }
    }

    let prices = store::latest_prices(conn)?;
    let mut total_value = Decimal::ZERO;
    let mut total_basis = Decimal::ZERO;
    for position in store::list_positions(conn)? {
        let holdings = store::position_holdings(conn, position.id)?;
        total_basis += holdings.cost_basis;
        // Positions without a stored price are valued at cost basis.
        total_value += match prices.get(&position.id) {
            Some(price) => holdings.market_value(*price),
            None => holdings.cost_basis,
        };
    }

    let (income, expenses) = income_expense(conn, start, end)?;

    Ok(DashboardSummary {
        period,
        start,
        end,
        balances: to_currency_amounts(balances),
        available_credit: to_currency_amounts(available),
        total_investment_value: total_value,
        investment_cost_basis: total_basis,
        unrealized_pl: total_value - total_basis,
        period_income: income,
        period_expenses: expenses,
        period_net: income + expenses,
    })
}

fn to_currency_amounts(map: BTreeMap<String, Decimal>) -> Vec<CurrencyAmount> {
    map.into_iter()
        .map(|(currency, amount)| CurrencyAmount { currency, amount })
        .collect()
}

/// Period income (sum of positive amounts) and expenses (sum of negative
/// amounts, kept negative). Transfer legs move money between own accounts
/// and are excluded from both.
fn income_expense(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> CoreResult<(Decimal, Decimal)> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE date>=?1 AND date<=?2 AND transfer_event_id IS NULL",
    )?;
    let rows = stmt.query_map(params![start, end], |r| r.get::<_, String>(0))?;
    let mut income = Decimal::ZERO;
    let mut expenses = Decimal::ZERO;
    for row in rows {
        let amount = Decimal::from_str_exact(&row?)
            .map_err(|e| CoreError::Consistency(format!("invalid stored amount: {}", e)))?;
        if amount > Decimal::ZERO {
            income += amount;
        } else {
            expenses += amount;
        }
    }
    Ok((income, expenses))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    BalanceTrend,
    Income,
    Expense,
}

impl FromStr for ChartKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance-trend" => Ok(ChartKind::BalanceTrend),
            "income" => Ok(ChartKind::Income),
            "expense" => Ok(ChartKind::Expense),
            other => Err(CoreError::Validation(format!(
                "unknown chart kind '{}', expected balance-trend|income|expense",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Decimal,
}

/// Calendar buckets for a period: the week view gets its seven days, the
/// month view Monday-started weeks clipped to the month, quarter and year
/// views calendar months.
pub fn chart_buckets(period: Period, today: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let (start, end) = period.span(today);
    match period {
        Period::Week => (0..7)
            .map(|i| {
                let day = start + Duration::days(i);
                (day, day)
            })
            .collect(),
        Period::Month => {
            let mut buckets = Vec::new();
            let mut cursor = start;
            while cursor <= end {
                let week_end = cursor
                    + Duration::days(6 - cursor.weekday().num_days_from_monday() as i64);
                let bucket_end = week_end.min(end);
                buckets.push((cursor, bucket_end));
                cursor = bucket_end + Duration::days(1);
            }
            buckets
        }
        Period::Quarter | Period::Year => {
            let mut buckets = Vec::new();
            let mut cursor = start;
            while cursor <= end {
                buckets.push((cursor, month_end(cursor)));
                cursor = month_end(cursor) + Duration::days(1);
            }
            buckets
        }
    }
}

fn bucket_label(period: Period, bucket_start: NaiveDate) -> String {
    match period {
        Period::Week | Period::Month => bucket_start.format("%Y-%m-%d").to_string(),
        Period::Quarter | Period::Year => bucket_start.format("%Y-%m").to_string(),
    }
}

/// A finite, restartable series of chart points. Each bucket's value is
/// computed on demand when the iterator reaches it; cloning (or `restart`)
/// yields the sequence again from the top.
#[derive(Clone)]
pub struct ChartSeries<'a> {
    conn: &'a Connection,
    kind: ChartKind,
    period: Period,
    buckets: Vec<(NaiveDate, NaiveDate)>,
    next: usize,
}

impl<'a> ChartSeries<'a> {
    pub fn restart(&mut self) {
        self.next = 0;
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn bucket_value(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<Decimal> {
        match self.kind {
            ChartKind::BalanceTrend => {
                // Credit card logs sum to their (negative) debt, so one
                // accessor covers both kinds.
                let mut total = Decimal::ZERO;
                for card in store::list_cards(self.conn)? {
                    total += store::card_balance_as_of(self.conn, &card, end)?;
                }
                Ok(total)
            }
            ChartKind::Income | ChartKind::Expense => {
                let (income, expenses) = income_expense(self.conn, start, end)?;
                Ok(match self.kind {
                    ChartKind::Income => income,
                    _ => expenses,
                })
            }
        }
    }
}

impl<'a> Iterator for ChartSeries<'a> {
    type Item = CoreResult<ChartPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, end) = *self.buckets.get(self.next)?;
        self.next += 1;
        let label = bucket_label(self.period, start);
        Some(
            self.bucket_value(start, end)
                .map(|value| ChartPoint { label, value }),
        )
    }
}

pub fn chart_series(
    conn: &Connection,
    kind: ChartKind,
    period: Period,
    today: NaiveDate,
) -> ChartSeries<'_> {
    ChartSeries {
        conn,
        kind,
        period,
        buckets: chart_buckets(period, today),
        next: 0,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub spent: Decimal,
}

/// Per-category expense totals over the period, largest first. Uncategorized
/// spending is reported under its own label rather than dropped.
pub fn spend_by_category(
    conn: &Connection,
    period: Period,
    today: NaiveDate,
) -> CoreResult<Vec<CategorySpend>> {
    let (start, end) = period.span(today);
    let mut stmt = conn.prepare(
        "SELECT category, amount FROM transactions
         WHERE date>=?1 AND date<=?2 AND transfer_event_id IS NULL",
    )?;
    let rows = stmt.query_map(params![start, end], |r| {
        Ok((r.get::<_, Option<String>>(0)?, r.get::<_, String>(1)?))
    })?;
    let mut agg: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let (category, amount_s) = row?;
        let amount = Decimal::from_str_exact(&amount_s)
            .map_err(|e| CoreError::Consistency(format!("invalid stored amount: {}", e)))?;
        if amount >= Decimal::ZERO {
            continue;
        }
        let category = category.unwrap_or_else(|| "(uncategorized)".to_string());
        *agg.entry(category).or_default() += -amount;
    }
    let mut items: Vec<CategorySpend> = agg
        .into_iter()
        .map(|(category, spent)| CategorySpend {
            category,
            spent: round_money(spent),
        })
        .collect();
    items.sort_by(|a, b| b.spent.cmp(&a.spent));
    Ok(items)
}
