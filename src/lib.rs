// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod allocation;
pub mod balance;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod models;
pub mod recurring;
pub mod store;
pub mod utils;
