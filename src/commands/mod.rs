// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accruals;
pub mod cards;
pub mod dashboard;
pub mod doctor;
pub mod exporter;
pub mod movements;
pub mod positions;
pub mod prices;
pub mod sections;
pub mod settings;
pub mod transactions;
pub mod transfers;
