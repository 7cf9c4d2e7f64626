// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accrual;
pub mod analytics;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod money;
pub mod position;
pub mod store;
pub mod transfer;
pub mod utils;
