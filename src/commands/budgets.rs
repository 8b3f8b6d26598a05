// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_of, required, resolve_category};
use crate::error::{LedgerError, LedgerResult};
use crate::guard::check_amount;
use crate::ledger::atomically;
use crate::models::Budget;
use crate::store::{ensure_exists, get_budget};
use crate::utils::{decimal_col, maybe_print_json, money, parse_money, pretty_table, today};
use anyhow::{anyhow, Result};
use chrono::Datelike;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let cat_id = resolve_category(conn, required(sub, "category")?)?;
            let month = *sub
                .get_one::<u32>("month")
                .ok_or_else(|| anyhow!("missing required argument --month"))?;
            let year = *sub
                .get_one::<i32>("year")
                .ok_or_else(|| anyhow!("missing required argument --year"))?;
            let b = create_budget(conn, cat_id, parse_money(required(sub, "amount")?)?, month, year)?;
            println!("Budget set for {}-{:02} / category {} = {}", b.year, b.month, b.category_id, b.amount);
        }
        Some(("edit", sub)) => {
            let amount = match sub.get_one::<String>("amount") {
                Some(raw) => Some(parse_money(raw)?),
                None => None,
            };
            let b = update_budget(
                conn,
                id_of(sub)?,
                amount,
                sub.get_one::<u32>("month").copied(),
                sub.get_one::<i32>("year").copied(),
            )?;
            println!("Updated budget {}: {}-{:02} = {}", b.id, b.year, b.month, b.amount);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            get_budget(conn, id)?;
            conn.execute("DELETE FROM budgets WHERE id=?1", params![id])?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let now = today();
    let month = sub.get_one::<u32>("month").copied().unwrap_or(now.month());
    let year = sub.get_one::<i32>("year").copied().unwrap_or(now.year());
    let data = budget_status(conn, month, year)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.category.clone(),
                    b.amount.to_string(),
                    b.spent.to_string(),
                    b.remaining.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Category", "Budget", "Spent", "Remaining"], rows)
        );
    }
    Ok(())
}

fn check_period(month: u32) -> LedgerResult<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(LedgerError::InvalidPeriod(month))
    }
}

fn period_taken(
    conn: &Connection,
    category_id: i64,
    month: u32,
    year: i32,
    except: Option<i64>,
) -> LedgerResult<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT id FROM budgets WHERE category_id=?1 AND month=?2 AND year=?3 AND id IS NOT ?4",
            params![category_id, month, year, except],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

pub fn create_budget(
    conn: &mut Connection,
    category_id: i64,
    amount: Decimal,
    month: u32,
    year: i32,
) -> LedgerResult<Budget> {
    let amount = money(amount);
    check_amount(amount)?;
    check_period(month)?;
    atomically(conn, |tx| {
        ensure_exists(tx, "categories", "Category", category_id)?;
        if period_taken(tx, category_id, month, year, None)? {
            return Err(LedgerError::DuplicatePeriod { category_id, month, year });
        }
        tx.execute(
            "INSERT INTO budgets(category_id, amount, month, year) VALUES (?1, ?2, ?3, ?4)",
            params![category_id, amount.to_string(), month, year],
        )?;
        get_budget(tx, tx.last_insert_rowid())
    })
}

pub fn update_budget(
    conn: &mut Connection,
    id: i64,
    amount: Option<Decimal>,
    month: Option<u32>,
    year: Option<i32>,
) -> LedgerResult<Budget> {
    let amount = amount.map(money);
    if let Some(a) = amount {
        check_amount(a)?;
    }
    if let Some(m) = month {
        check_period(m)?;
    }
    atomically(conn, |tx| {
        let cur = get_budget(tx, id)?;
        let month = month.unwrap_or(cur.month);
        let year = year.unwrap_or(cur.year);
        if period_taken(tx, cur.category_id, month, year, Some(id))? {
            return Err(LedgerError::DuplicatePeriod {
                category_id: cur.category_id,
                month,
                year,
            });
        }
        tx.execute(
            "UPDATE budgets SET amount=?1, month=?2, year=?3 WHERE id=?4",
            params![amount.unwrap_or(cur.amount).to_string(), month, year, id],
        )?;
        get_budget(tx, id)
    })
}

#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    pub id: i64,
    pub category_id: i64,
    pub category: String,
    pub amount: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

/// Budgets for one month with the expenses booked against each category.
pub fn budget_status(conn: &Connection, month: u32, year: i32) -> LedgerResult<Vec<BudgetStatus>> {
    check_period(month)?;
    let mut stmt = conn.prepare(
        "SELECT b.id, b.category_id, c.name, b.amount FROM budgets b
         JOIN categories c ON b.category_id=c.id
         WHERE b.month=?1 AND b.year=?2 ORDER BY c.name",
    )?;
    let budgets = stmt.query_map(params![month, year], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            decimal_col(r, 3)?,
        ))
    })?;
    let period = format!("{:04}-{:02}", year, month);
    let mut spent_stmt = conn.prepare_cached(
        "SELECT amount FROM transactions WHERE category_id=?1 AND kind='expense' AND substr(date,1,7)=?2",
    )?;

    let mut out = Vec::new();
    for b in budgets {
        let (id, category_id, category, amount) = b?;
        let mut spent = Decimal::ZERO;
        let mut rows = spent_stmt.query(params![category_id, period])?;
        while let Some(r) = rows.next()? {
            spent += decimal_col(r, 0)?;
        }
        out.push(BudgetStatus {
            id,
            category_id,
            category,
            amount,
            spent: money(spent),
            remaining: money(amount - spent),
        });
    }
    Ok(out)
}
