// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Accrual engine: compound interest/fee amounts as a pure function of
//! terms and elapsed time. Nothing here schedules anything; the caller asks
//! "how much would accrue over this window" and applies the answer itself.

use crate::error::{CoreError, CoreResult};
use crate::models::{AccrualConfig, CompoundFrequency};
use crate::money::round_money;
use crate::store;
use rusqlite::Connection;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::Serialize;

/// Unrounded compound growth `P * ((1 + r/100/n)^(n*t) - 1)` for `t` years.
/// `None` when the exponentiation or the final multiply overflows `Decimal`.
fn compound_growth(
    principal: Decimal,
    rate_pct: Decimal,
    compound: CompoundFrequency,
    years: Decimal,
) -> Option<Decimal> {
    let n = Decimal::from(compound.periods_per_year());
    let base = Decimal::ONE + rate_pct / Decimal::ONE_HUNDRED / n;
    let exponent = n * years;
    let grown = base.checked_powd(exponent)?;
    principal.checked_mul(grown - Decimal::ONE)
}

fn overflow_error() -> CoreError {
    CoreError::Validation("terms too large to compound".into())
}

/// Amount accrued on `principal` over `elapsed_days`, rounded once to money
/// scale. Fees come back negated so callers can always add the result.
/// Elapsed days convert to years over the frequency's day-count basis
/// (360 for the `daily_360` convention, 365 otherwise).
pub fn accrued_amount(
    principal: Decimal,
    rate_pct: Decimal,
    is_fee: bool,
    compound: CompoundFrequency,
    elapsed_days: i64,
) -> CoreResult<Decimal> {
    if rate_pct < Decimal::ZERO {
        return Err(CoreError::Validation(
            "rate must be non-negative (use the fee flag for charges)".into(),
        ));
    }
    if elapsed_days <= 0 {
        return Err(CoreError::Validation(
            "elapsed days must be positive".into(),
        ));
    }
    if principal <= Decimal::ZERO || rate_pct.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let years = Decimal::from(elapsed_days) / Decimal::from(compound.day_count_basis());
    let accrued = compound_growth(principal, rate_pct, compound, years)
        .map(round_money)
        .ok_or_else(overflow_error)?;
    Ok(if is_fee { -accrued } else { accrued })
}

/// Effective annual rate `(1 + r/n)^n - 1`, as a percentage with four
/// fractional digits.
pub fn effective_annual_rate(rate_pct: Decimal, compound: CompoundFrequency) -> CoreResult<Decimal> {
    if rate_pct < Decimal::ZERO {
        return Err(CoreError::Validation(
            "rate must be non-negative (use the fee flag for charges)".into(),
        ));
    }
    let n = Decimal::from(compound.periods_per_year());
    let base = Decimal::ONE + rate_pct / Decimal::ONE_HUNDRED / n;
    let ear = base
        .checked_powd(n)
        .and_then(|p| (p - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow_error)?;
    Ok(ear.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero))
}

#[derive(Debug, Clone, Serialize)]
pub struct AccrualLine {
    pub name: String,
    pub kind: &'static str,
    pub rate: Decimal,
    pub payment_frequency: String,
    pub compound_frequency: String,
    pub amount: Decimal,
    pub effective_annual_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccrualProjection {
    pub card_id: i64,
    pub principal: Decimal,
    pub months: u32,
    pub total_interest: Decimal,
    pub total_fees: Decimal,
    pub final_amount: Decimal,
    pub breakdown: Vec<AccrualLine>,
}

/// Projects every active accrual config of a card over a horizon of whole
/// months. Fees reduce the final amount, interest raises it.
pub fn card_projection(
    conn: &Connection,
    card_id: i64,
    principal: Decimal,
    months: u32,
) -> CoreResult<AccrualProjection> {
    if months == 0 {
        return Err(CoreError::Validation("months must be positive".into()));
    }
    store::get_card(conn, card_id)?;
    let configs = store::list_accruals(conn, card_id)?;

    let years = Decimal::from(months) / Decimal::from(12u32);
    let mut total_interest = Decimal::ZERO;
    let mut total_fees = Decimal::ZERO;
    let mut breakdown = Vec::new();

    for cfg in configs.iter().filter(|c| c.is_active) {
        let amount = signed_growth(cfg, principal, years)?;
        if cfg.is_fee {
            total_fees += amount.abs();
        } else {
            total_interest += amount;
        }
        breakdown.push(AccrualLine {
            name: cfg.name.clone(),
            kind: if cfg.is_fee { "fee" } else { "interest" },
            rate: cfg.rate,
            payment_frequency: cfg.payment_frequency.as_str().to_string(),
            compound_frequency: cfg.compound_frequency.as_str().to_string(),
            amount,
            effective_annual_rate: effective_annual_rate(cfg.rate, cfg.compound_frequency)?,
        });
    }

    Ok(AccrualProjection {
        card_id,
        principal,
        months,
        total_interest,
        total_fees,
        final_amount: principal + total_interest - total_fees,
        breakdown,
    })
}

fn signed_growth(cfg: &AccrualConfig, principal: Decimal, years: Decimal) -> CoreResult<Decimal> {
    if principal <= Decimal::ZERO || cfg.rate.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let accrued = compound_growth(principal, cfg.rate, cfg.compound_frequency, years)
        .map(round_money)
        .ok_or_else(overflow_error)?;
    Ok(if cfg.is_fee { -accrued } else { accrued })
}
