// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::{self, ChartKind, Period};
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;

fn period_and_date(sub: &clap::ArgMatches) -> Result<(Period, NaiveDate)> {
    let period = match sub.get_one::<String>("period") {
        Some(s) => s.trim().parse()?,
        None => Period::Month,
    };
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s.trim())?,
        None => Local::now().date_naive(),
    };
    Ok((period, date))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("chart", sub)) => chart(conn, sub)?,
        Some(("categories", sub)) => categories(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (period, date) = period_and_date(sub)?;
    let summary = analytics::dashboard_summary(conn, period, date)?;
    if maybe_print_json(sub.get_flag("json"), false, &summary)? {
        return Ok(());
    }
    println!(
        "{} {} to {}",
        summary.period.as_str(),
        summary.start,
        summary.end
    );
    let mut rows = Vec::new();
    for b in &summary.balances {
        rows.push(vec!["balance".to_string(), fmt_money(&b.amount, &b.currency)]);
    }
    for a in &summary.available_credit {
        rows.push(vec![
            "available credit".to_string(),
            fmt_money(&a.amount, &a.currency),
        ]);
    }
    let ccy = store::default_currency(conn)?;
    rows.push(vec![
        "investments".to_string(),
        fmt_money(&summary.total_investment_value, &ccy),
    ]);
    rows.push(vec![
        "cost basis".to_string(),
        fmt_money(&summary.investment_cost_basis, &ccy),
    ]);
    rows.push(vec![
        "unrealized P&L".to_string(),
        fmt_money(&summary.unrealized_pl, &ccy),
    ]);
    rows.push(vec![
        "income".to_string(),
        fmt_money(&summary.period_income, &ccy),
    ]);
    rows.push(vec![
        "expenses".to_string(),
        fmt_money(&summary.period_expenses, &ccy),
    ]);
    rows.push(vec!["net".to_string(), fmt_money(&summary.period_net, &ccy)]);
    println!("{}", pretty_table(&["Metric", "Value"], rows));
    Ok(())
}

fn chart(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (period, date) = period_and_date(sub)?;
    let kind: ChartKind = sub.get_one::<String>("kind").unwrap().trim().parse()?;
    let points = analytics::chart_series(conn, kind, period, date)
        .collect::<Result<Vec<_>, _>>()?;
    if maybe_print_json(sub.get_flag("json"), false, &points)? {
        return Ok(());
    }
    let rows = points
        .into_iter()
        .map(|p| vec![p.label, p.value.to_string()])
        .collect();
    println!("{}", pretty_table(&["Bucket", "Value"], rows));
    Ok(())
}

fn categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (period, date) = period_and_date(sub)?;
    let spend = analytics::spend_by_category(conn, period, date)?;
    if maybe_print_json(sub.get_flag("json"), false, &spend)? {
        return Ok(());
    }
    let rows = spend
        .into_iter()
        .map(|c| vec![c.category, c.spent.to_string()])
        .collect();
    println!("{}", pretty_table(&["Category", "Spent"], rows));
    Ok(())
}
