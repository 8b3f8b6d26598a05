// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits of every stored amount.
pub const MONEY_SCALE: u32 = 2;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s.trim()))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s.trim()))
}

/// Parses a user-supplied amount and brings it to currency scale.
pub fn parse_money(s: &str) -> Result<Decimal> {
    Ok(money(parse_decimal(s)?))
}

/// Rounds to two fractional digits (midpoint away from zero) and pins the
/// scale so `10` renders as `10.00`.
pub fn money(d: Decimal) -> Decimal {
    let mut v = d.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(MONEY_SCALE);
    v
}

pub fn fmt_money(d: &Decimal, symbol: &str) -> String {
    format!("{}{}", symbol, money(*d))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Reads a TEXT amount column as an exact decimal.
pub fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line.
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn opt_text(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

/// Trims a free-text CLI value, treating blank as absent.
pub fn trimmed(v: Option<&String>) -> Option<String> {
    v.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_pins_two_digits() {
        assert_eq!(money(Decimal::from(10)).to_string(), "10.00");
        assert_eq!(parse_money(" 0.125 ").unwrap().to_string(), "0.13");
        assert_eq!(parse_money("-2.5").unwrap().to_string(), "-2.50");
    }

    #[test]
    fn repeated_cents_do_not_drift() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += parse_money("0.10").unwrap();
        }
        for _ in 0..1000 {
            total -= parse_money("0.10").unwrap();
        }
        assert_eq!(money(total).to_string(), "0.00");
    }

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(trimmed(Some(&"  ".to_string())), None);
        assert_eq!(trimmed(Some(&" rent ".to_string())), Some("rent".into()));
    }
}
