// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Position engine: folds a movement log into current holdings and cost
//! basis. Derived state is never stored; every read replays the log, so the
//! log is the single source of truth and replay is trivially deterministic.
//!
//! Cost basis method is weighted-average. On each sell the average cost is
//! settled to money scale first, then realized P&L and the remaining basis
//! derive from that settled figure, which keeps the basis at exactly zero
//! when a position closes.

use crate::error::{CoreError, CoreResult};
use crate::models::{Movement, MovementKind};
use crate::money::round_money;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holdings {
    pub held_quantity: Decimal,
    pub average_cost: Decimal,
    pub cost_basis: Decimal,
    pub realized_pl: Decimal,
}

impl Holdings {
    pub fn empty() -> Self {
        Holdings {
            held_quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            realized_pl: Decimal::ZERO,
        }
    }

    /// Market price is always supplied by the caller; the engine never
    /// fetches one.
    pub fn market_value(&self, market_price: Decimal) -> Decimal {
        round_money(self.held_quantity * market_price)
    }

    pub fn unrealized_pl(&self, market_price: Decimal) -> Decimal {
        round_money(self.held_quantity * (market_price - self.average_cost))
    }
}

/// Replays a movement log in economic-time order (`datetime` ascending, id
/// ascending as tie-break). A sell exceeding the held quantity fails with
/// `InsufficientHoldings` and no partial state escapes.
pub fn replay(movements: &[Movement]) -> CoreResult<Holdings> {
    let mut ordered: Vec<&Movement> = movements.iter().collect();
    ordered.sort_by(|a, b| a.datetime.cmp(&b.datetime).then(a.id.cmp(&b.id)));

    let mut held = Decimal::ZERO;
    let mut basis = Decimal::ZERO;
    let mut realized = Decimal::ZERO;

    for m in ordered {
        match m.kind {
            MovementKind::Buy => {
                held += m.quantity;
                basis += m.total_amount;
            }
            MovementKind::Sell => {
                if m.quantity > held {
                    return Err(CoreError::InsufficientHoldings {
                        requested: m.quantity,
                        available: held,
                    });
                }
                let average_cost = round_money(basis / held);
                realized += round_money(m.quantity * (m.price_per_unit - average_cost));
                held -= m.quantity;
                basis = if held.is_zero() {
                    Decimal::ZERO
                } else {
                    round_money(held * average_cost)
                };
            }
        }
    }

    let average_cost = if held.is_zero() {
        Decimal::ZERO
    } else {
        round_money(basis / held)
    };

    Ok(Holdings {
        held_quantity: held,
        average_cost,
        cost_basis: basis,
        realized_pl: realized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn movement(id: i64, kind: MovementKind, qty: &str, price: &str, day: u32) -> Movement {
        let quantity = d(qty);
        let price_per_unit = d(price);
        Movement {
            id,
            position_id: 1,
            kind,
            quantity,
            price_per_unit,
            total_amount: round_money(quantity * price_per_unit),
            datetime: NaiveDate::from_ymd_opt(2025, 1, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            description: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn empty_log_is_flat() {
        assert_eq!(replay(&[]).unwrap(), Holdings::empty());
    }

    #[test]
    fn buys_accumulate_weighted_average() {
        let log = vec![
            movement(1, MovementKind::Buy, "10", "150.00", 1),
            movement(2, MovementKind::Buy, "5", "160.00", 2),
        ];
        let h = replay(&log).unwrap();
        assert_eq!(h.held_quantity, d("15"));
        assert_eq!(h.cost_basis, d("2300.00"));
        assert_eq!(h.average_cost, d("153.33"));
        assert_eq!(h.realized_pl, Decimal::ZERO);
    }

    #[test]
    fn partial_sell_realizes_against_average_cost() {
        let log = vec![
            movement(1, MovementKind::Buy, "10", "150.00", 1),
            movement(2, MovementKind::Buy, "5", "160.00", 2),
            movement(3, MovementKind::Sell, "12", "170.00", 3),
        ];
        let h = replay(&log).unwrap();
        assert_eq!(h.held_quantity, d("3"));
        assert_eq!(h.realized_pl, d("200.04"));
        assert_eq!(h.cost_basis, d("459.99"));
        assert_eq!(h.average_cost, d("153.33"));
    }

    #[test]
    fn overselling_is_rejected_not_clamped() {
        let log = vec![
            movement(1, MovementKind::Buy, "10", "150.00", 1),
            movement(2, MovementKind::Buy, "5", "160.00", 2),
            movement(3, MovementKind::Sell, "12", "170.00", 3),
            movement(4, MovementKind::Sell, "20", "170.00", 4),
        ];
        let err = replay(&log).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientHoldings {
                requested: d("20"),
                available: d("3"),
            }
        );
    }

    #[test]
    fn closing_a_position_zeroes_basis_and_average() {
        let log = vec![
            movement(1, MovementKind::Buy, "4", "25.00", 1),
            movement(2, MovementKind::Sell, "4", "30.00", 2),
        ];
        let h = replay(&log).unwrap();
        assert_eq!(h.held_quantity, Decimal::ZERO);
        assert_eq!(h.cost_basis, Decimal::ZERO);
        assert_eq!(h.average_cost, Decimal::ZERO);
        assert_eq!(h.realized_pl, d("20.00"));
    }

    #[test]
    fn replay_orders_by_datetime_then_id() {
        // Sell is inserted first (lowest id) but dated after the buy.
        let log = vec![
            movement(1, MovementKind::Sell, "2", "12.00", 5),
            movement(2, MovementKind::Buy, "2", "10.00", 1),
        ];
        let h = replay(&log).unwrap();
        assert_eq!(h.held_quantity, Decimal::ZERO);
        assert_eq!(h.realized_pl, d("4.00"));

        // Same datetime: id decides, and the sell (lower id) comes first.
        let log = vec![
            movement(1, MovementKind::Sell, "2", "12.00", 1),
            movement(2, MovementKind::Buy, "2", "10.00", 1),
        ];
        assert!(replay(&log).is_err());
    }

    #[test]
    fn replay_is_idempotent_over_the_same_log() {
        let log = vec![
            movement(1, MovementKind::Buy, "0.50000000", "40000.00", 1),
            movement(2, MovementKind::Sell, "0.20000000", "45000.00", 2),
            movement(3, MovementKind::Buy, "1.00000000", "38000.00", 3),
        ];
        let first = replay(&log).unwrap();
        let second = replay(&log).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unrealized_pl_uses_supplied_price() {
        let log = vec![
            movement(1, MovementKind::Buy, "10", "150.00", 1),
            movement(2, MovementKind::Buy, "5", "160.00", 2),
        ];
        let h = replay(&log).unwrap();
        assert_eq!(h.unrealized_pl(d("160.00")), d("100.05"));
        assert_eq!(h.market_value(d("160.00")), d("2400.00"));
    }
}
