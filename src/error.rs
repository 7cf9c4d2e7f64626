// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failure taxonomy for the financial core. Every variant is surfaced to the
/// caller; the core never recovers to a best-effort figure.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Insufficient holdings: tried to sell {requested} with only {available} held")]
    InsufficientHoldings {
        requested: Decimal,
        available: Decimal,
    },
    #[error("Not found: {0}")]
    Reference(String),
    #[error("Inconsistent data: {0}")]
    Consistency(String),
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl PartialEq for CoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (
                Self::InsufficientHoldings {
                    requested: ra,
                    available: aa,
                },
                Self::InsufficientHoldings {
                    requested: rb,
                    available: ab,
                },
            ) => ra == rb && aa == ab,
            (Self::Reference(a), Self::Reference(b)) => a == b,
            (Self::Consistency(a), Self::Consistency(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
