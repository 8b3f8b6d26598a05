// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod allocation;
pub mod balance;
pub mod budgets;
pub mod categories;
pub mod doctor;
pub mod goals;
pub mod recurring;
pub mod settings;
pub mod transactions;
pub mod transfers;

use crate::store::{id_for_account, id_for_category};
use anyhow::{anyhow, Result};
use rusqlite::Connection;

/// Accepts a numeric id or an exact account name.
pub fn resolve_account(conn: &Connection, raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(id);
    }
    id_for_account(conn, raw)?.ok_or_else(|| anyhow!("Account '{}' not found", raw))
}

/// Accepts a numeric id or an exact category name.
pub fn resolve_category(conn: &Connection, raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(id);
    }
    id_for_category(conn, raw)?.ok_or_else(|| anyhow!("Category '{}' not found", raw))
}

pub(crate) fn required<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a String> {
    m.get_one::<String>(id)
        .ok_or_else(|| anyhow!("missing required argument --{}", id))
}

pub(crate) fn id_of(m: &clap::ArgMatches) -> Result<i64> {
    m.get_one::<i64>("id")
        .copied()
        .ok_or_else(|| anyhow!("missing required argument --id"))
}

pub(crate) fn parse_enum<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|e| anyhow!(e))
}
