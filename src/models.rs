// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Plain data records for the persisted entities and the closed enums that
//! guard their string-typed columns. Unknown strings are rejected at the
//! boundary; defaults apply only when a field was left unset at creation.

use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Debit,
    Credit,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Debit => "debit",
            CardKind::Credit => "credit",
        }
    }
}

impl FromStr for CardKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(CardKind::Debit),
            "credit" => Ok(CardKind::Credit),
            other => Err(CoreError::Validation(format!(
                "unknown card kind '{}', expected debit|credit",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub name: String,
    pub kind: CardKind,
    pub currency: String,
    /// Starting offset for debit cards; the current balance is always derived
    /// from the transaction log, never stored.
    pub opening_balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub card_id: i64,
    pub name: String,
    pub initial_balance: Decimal,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Endpoint {
    Card(i64),
    Cash,
    Stock(i64),
    Crypto(i64),
}

impl Endpoint {
    pub fn kind(&self) -> &'static str {
        match self {
            Endpoint::Card(_) => "card",
            Endpoint::Cash => "cash",
            Endpoint::Stock(_) => "stock",
            Endpoint::Crypto(_) => "crypto",
        }
    }

    pub fn target_id(&self) -> Option<i64> {
        match self {
            Endpoint::Card(id) | Endpoint::Stock(id) | Endpoint::Crypto(id) => Some(*id),
            Endpoint::Cash => None,
        }
    }

    pub fn from_parts(kind: &str, id: Option<i64>) -> Result<Endpoint, CoreError> {
        match (kind, id) {
            ("card", Some(id)) => Ok(Endpoint::Card(id)),
            ("cash", None) => Ok(Endpoint::Cash),
            ("stock", Some(id)) => Ok(Endpoint::Stock(id)),
            ("crypto", Some(id)) => Ok(Endpoint::Crypto(id)),
            ("cash", Some(_)) => Err(CoreError::Validation(
                "cash endpoint does not take an id".into(),
            )),
            ("card" | "stock" | "crypto", None) => Err(CoreError::Validation(format!(
                "endpoint type '{}' requires an id",
                kind
            ))),
            (other, _) => Err(CoreError::Validation(format!(
                "unknown endpoint type '{}', expected card|cash|stock|crypto",
                other
            ))),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target_id() {
            Some(id) => write!(f, "{}:{}", self.kind(), id),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Reader-side projection of a transaction row. Legs of an internal transfer
/// carry the owning event's endpoints; plain rows leave them empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub card_id: Option<i64>,
    pub section_id: Option<i64>,
    pub category: Option<String>,
    pub transfer_event_id: Option<i64>,
    pub is_internal_transfer: bool,
    pub transfer_from: Option<Endpoint>,
    pub transfer_to: Option<Endpoint>,
    pub created_at: String,
}

/// Aggregate owning both legs of an internal transfer. The legs are only
/// reachable through the event, so a half-pair is never an observable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEvent {
    pub id: i64,
    pub from: Endpoint,
    pub to: Endpoint,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Crypto => "crypto",
        }
    }
}

impl FromStr for AssetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock" => Ok(AssetType::Stock),
            "crypto" => Ok(AssetType::Crypto),
            other => Err(CoreError::Validation(format!(
                "unknown asset type '{}', expected stock|crypto",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub asset_type: AssetType,
    pub symbol: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Buy,
    Sell,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Buy => "buy",
            MovementKind::Sell => "sell",
        }
    }
}

impl FromStr for MovementKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(MovementKind::Buy),
            "sell" => Ok(MovementKind::Sell),
            other => Err(CoreError::Validation(format!(
                "unknown movement kind '{}', expected buy|sell",
                other
            ))),
        }
    }
}

/// One buy or sell event in a position's append-only log. `datetime` is the
/// economic event time and drives replay ordering; `created_at` is the
/// insertion audit time and drives nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub position_id: i64,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
    pub datetime: NaiveDateTime,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

impl PaymentFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Daily => "daily",
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Quarterly => "quarterly",
            PaymentFrequency::Annually => "annually",
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Daily => 365,
            PaymentFrequency::Weekly => 52,
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::Annually => 1,
        }
    }
}

impl FromStr for PaymentFrequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(PaymentFrequency::Daily),
            "weekly" => Ok(PaymentFrequency::Weekly),
            "monthly" => Ok(PaymentFrequency::Monthly),
            "quarterly" => Ok(PaymentFrequency::Quarterly),
            "annually" => Ok(PaymentFrequency::Annually),
            other => Err(CoreError::Validation(format!(
                "unknown payment frequency '{}', expected daily|weekly|monthly|quarterly|annually",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundFrequency {
    Daily365,
    Daily360,
    SemiWeekly104,
    Weekly52,
    BiWeekly26,
    SemiMonthly24,
    Monthly12,
    BiMonthly6,
    Quarterly4,
    HalfYearly2,
    Yearly1,
}

impl CompoundFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundFrequency::Daily365 => "daily_365",
            CompoundFrequency::Daily360 => "daily_360",
            CompoundFrequency::SemiWeekly104 => "semi_weekly_104",
            CompoundFrequency::Weekly52 => "weekly_52",
            CompoundFrequency::BiWeekly26 => "bi_weekly_26",
            CompoundFrequency::SemiMonthly24 => "semi_monthly_24",
            CompoundFrequency::Monthly12 => "monthly_12",
            CompoundFrequency::BiMonthly6 => "bi_monthly_6",
            CompoundFrequency::Quarterly4 => "quarterly_4",
            CompoundFrequency::HalfYearly2 => "half_yearly_2",
            CompoundFrequency::Yearly1 => "yearly_1",
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        match self {
            CompoundFrequency::Daily365 => 365,
            CompoundFrequency::Daily360 => 360,
            CompoundFrequency::SemiWeekly104 => 104,
            CompoundFrequency::Weekly52 => 52,
            CompoundFrequency::BiWeekly26 => 26,
            CompoundFrequency::SemiMonthly24 => 24,
            CompoundFrequency::Monthly12 => 12,
            CompoundFrequency::BiMonthly6 => 6,
            CompoundFrequency::Quarterly4 => 4,
            CompoundFrequency::HalfYearly2 => 2,
            CompoundFrequency::Yearly1 => 1,
        }
    }

    /// Day-count basis used to turn elapsed days into years. Only the 360-day
    /// convention deviates from the civil year.
    pub fn day_count_basis(&self) -> u32 {
        match self {
            CompoundFrequency::Daily360 => 360,
            _ => 365,
        }
    }
}

impl FromStr for CompoundFrequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily_365" => Ok(CompoundFrequency::Daily365),
            "daily_360" => Ok(CompoundFrequency::Daily360),
            "semi_weekly_104" => Ok(CompoundFrequency::SemiWeekly104),
            "weekly_52" => Ok(CompoundFrequency::Weekly52),
            "bi_weekly_26" => Ok(CompoundFrequency::BiWeekly26),
            "semi_monthly_24" => Ok(CompoundFrequency::SemiMonthly24),
            "monthly_12" => Ok(CompoundFrequency::Monthly12),
            "bi_monthly_6" => Ok(CompoundFrequency::BiMonthly6),
            "quarterly_4" => Ok(CompoundFrequency::Quarterly4),
            "half_yearly_2" => Ok(CompoundFrequency::HalfYearly2),
            "yearly_1" => Ok(CompoundFrequency::Yearly1),
            other => Err(CoreError::Validation(format!(
                "unknown compound frequency '{}'",
                other
            ))),
        }
    }
}

/// Interest (or fee, when `is_fee`) terms attached to a card. Payment and
/// compound frequency are independent axes: the first says when an accrued
/// amount is realized, the second how often it compounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualConfig {
    pub id: i64,
    pub card_id: i64,
    pub name: String,
    pub rate: Decimal,
    pub is_fee: bool,
    pub payment_frequency: PaymentFrequency,
    pub compound_frequency: CompoundFrequency,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub id: i64,
    pub position_id: i64,
    pub as_of: NaiveDateTime,
    pub price: Decimal,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_strings_round_trip() {
        for s in [
            "daily_365",
            "daily_360",
            "semi_weekly_104",
            "weekly_52",
            "bi_weekly_26",
            "semi_monthly_24",
            "monthly_12",
            "bi_monthly_6",
            "quarterly_4",
            "half_yearly_2",
            "yearly_1",
        ] {
            let f: CompoundFrequency = s.parse().unwrap();
            assert_eq!(f.as_str(), s);
        }
        assert!("fortnightly".parse::<CompoundFrequency>().is_err());
    }

    #[test]
    fn compound_periods_match_suffix() {
        assert_eq!(CompoundFrequency::Monthly12.periods_per_year(), 12);
        assert_eq!(CompoundFrequency::SemiWeekly104.periods_per_year(), 104);
        assert_eq!(CompoundFrequency::Daily360.day_count_basis(), 360);
        assert_eq!(CompoundFrequency::Monthly12.day_count_basis(), 365);
    }

    #[test]
    fn endpoint_parts_are_checked() {
        assert_eq!(
            Endpoint::from_parts("card", Some(3)).unwrap(),
            Endpoint::Card(3)
        );
        assert_eq!(Endpoint::from_parts("cash", None).unwrap(), Endpoint::Cash);
        assert!(Endpoint::from_parts("cash", Some(1)).is_err());
        assert!(Endpoint::from_parts("stock", None).is_err());
        assert!(Endpoint::from_parts("wallet", Some(1)).is_err());
    }
}
