// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::balance::{available_balance, snapshot};
use crate::error::LedgerResult;
use crate::utils::{decimal_col, money, pretty_table, today};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = check(conn, today())?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues.into_iter().map(|i| vec![i.code.into(), i.detail]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub code: &'static str,
    pub detail: String,
}

fn issue(code: &'static str, detail: String) -> Issue {
    Issue { code, detail }
}

/// Consistency report for the ledger as of `as_of`. Empty when healthy.
pub fn check(conn: &Connection, as_of: NaiveDate) -> LedgerResult<Vec<Issue>> {
    snapshot(conn, |conn| run_checks(conn, as_of))
}

fn run_checks(conn: &Connection, as_of: NaiveDate) -> LedgerResult<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Goal totals vs contribution history
    let mut goals = conn.prepare("SELECT id, target_amount, current_amount, completed FROM goals ORDER BY id")?;
    let mut sums = conn.prepare_cached("SELECT amount FROM goal_contributions WHERE goal_id=?1")?;
    let mut cur = goals.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let target = decimal_col(r, 1)?;
        let current = decimal_col(r, 2)?;
        let completed: bool = r.get(3)?;

        let mut total = Decimal::ZERO;
        let mut rows = sums.query(params![id])?;
        while let Some(c) = rows.next()? {
            total += decimal_col(c, 0)?;
        }
        if money(total) != money(current) {
            issues.push(issue(
                "goal_amount_mismatch",
                format!("goal {}: current {} but contributions sum to {}", id, current, money(total)),
            ));
        }
        // Completion is one-way, so only a reached-but-open goal is wrong.
        if current >= target && !completed {
            issues.push(issue(
                "goal_not_completed",
                format!("goal {}: {} of {} saved but not completed", id, current, target),
            ));
        }
    }

    // 2) Exactly one default account once any exist
    let (accounts, defaults): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(is_default), 0) FROM accounts",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    if accounts > 0 && defaults != 1 {
        issues.push(issue(
            "default_account_count",
            format!("{} default accounts among {}", defaults, accounts),
        ));
    }

    // 3) Global invariant
    let available = available_balance(conn)?;
    if available < Decimal::ZERO {
        issues.push(issue("negative_balance", format!("available balance is {}", available)));
    }

    // 4) Templates still waiting for a run
    let mut due = conn.prepare(
        "SELECT id, next_date FROM recurring_transactions WHERE is_active=1 AND next_date<=?1 ORDER BY next_date, id",
    )?;
    let mut cur = due.query(params![as_of])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let next: NaiveDate = r.get(1)?;
        issues.push(issue(
            "recurring_due",
            format!("template {} due since {}", id, next),
        ));
    }

    Ok(issues)
}
