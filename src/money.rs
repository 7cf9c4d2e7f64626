// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fixed-point arithmetic rules for the whole crate: currency amounts carry
//! two fractional digits, asset quantities eight. Rounding is half-up
//! (midpoint away from zero), applied once at the end of a computation
//! chain, never per intermediate step.

use rust_decimal::{Decimal, RoundingStrategy};

pub const MONEY_SCALE: u32 = 2;
pub const QUANTITY_SCALE: u32 = 8;

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Tolerance for stored totals that were produced by an earlier rounding of
/// quantity × price: anything within one cent is the same amount.
pub fn money_eq_within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= Decimal::new(1, 2)
}
