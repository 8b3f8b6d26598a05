// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance calculator.
//!
//! Available balance is `income - expense - goal contributions` over every
//! row in the ledger. Account balance is `income - expense + transfers in -
//! transfers out` over rows attributed to one account; transactions with no
//! account never count towards any account.
//!
//! Amounts are stored as TEXT and summed here as exact decimals, never via
//! SQLite's floating point `SUM`. Each read runs under one snapshot: the
//! open unit of work when there is one, otherwise a read transaction held
//! across all of its queries.

use crate::error::LedgerResult;
use crate::models::TxKind;
use crate::utils::{decimal_col, money};
use rusqlite::{params, Connection, Params};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub contributions: Decimal,
    /// `income - expense - contributions`.
    pub available: Decimal,
}

impl Totals {
    pub fn new(income: Decimal, expense: Decimal, contributions: Decimal) -> Self {
        Self {
            income: money(income),
            expense: money(expense),
            contributions: money(contributions),
            available: money(income - expense - contributions),
        }
    }
}

/// Runs `f` against a single read snapshot. Inside an open unit of work the
/// unit's own snapshot is used as is.
pub fn snapshot<T, F>(conn: &Connection, f: F) -> LedgerResult<T>
where
    F: FnOnce(&Connection) -> LedgerResult<T>,
{
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = conn.unchecked_transaction()?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

fn sum_amounts<P: Params>(conn: &Connection, sql: &str, p: P) -> LedgerResult<Decimal> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(p)?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        total += decimal_col(r, 0)?;
    }
    Ok(total)
}

fn sum_kind(conn: &Connection, kind: TxKind) -> LedgerResult<Decimal> {
    sum_amounts(
        conn,
        "SELECT amount FROM transactions WHERE kind=?1",
        params![kind],
    )
}

pub fn totals(conn: &Connection) -> LedgerResult<Totals> {
    snapshot(conn, |conn| {
        let income = sum_kind(conn, TxKind::Income)?;
        let expense = sum_kind(conn, TxKind::Expense)?;
        let contributions = sum_amounts(conn, "SELECT amount FROM goal_contributions", [])?;
        Ok(Totals::new(income, expense, contributions))
    })
}

pub fn available_balance(conn: &Connection) -> LedgerResult<Decimal> {
    let available = totals(conn)?.available;
    tracing::debug!(%available, "available balance computed");
    Ok(available)
}

pub fn account_balance(conn: &Connection, account_id: i64) -> LedgerResult<Decimal> {
    let balance = snapshot(conn, |conn| account_sums(conn, account_id))?;
    tracing::debug!(account_id, %balance, "account balance computed");
    Ok(balance)
}

fn account_sums(conn: &Connection, account_id: i64) -> LedgerResult<Decimal> {
    let income = sum_amounts(
        conn,
        "SELECT amount FROM transactions WHERE account_id=?1 AND kind=?2",
        params![account_id, TxKind::Income],
    )?;
    let expense = sum_amounts(
        conn,
        "SELECT amount FROM transactions WHERE account_id=?1 AND kind=?2",
        params![account_id, TxKind::Expense],
    )?;
    let transfers_in = sum_amounts(
        conn,
        "SELECT amount FROM transfers WHERE to_account_id=?1",
        params![account_id],
    )?;
    let transfers_out = sum_amounts(
        conn,
        "SELECT amount FROM transfers WHERE from_account_id=?1",
        params![account_id],
    )?;
    Ok(money(income - expense + transfers_in - transfers_out))
}
