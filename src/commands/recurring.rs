// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_of, parse_enum, required, resolve_category};
use crate::error::LedgerResult;
use crate::guard::check_amount;
use crate::ledger::{atomically, run_recurring_generation};
use crate::models::{Interval, RecurringTemplate, TxKind};
use crate::store::{ensure_exists, get_recurring, recurring_from_row, RECURRING_COLS};
use crate::utils::{maybe_print_json, money, opt_text, parse_date, parse_money, pretty_table, today, trimmed};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let template = NewTemplate {
                amount: parse_money(required(sub, "amount")?)?,
                kind: parse_enum(required(sub, "kind")?)?,
                description: trimmed(sub.get_one::<String>("description")),
                category_id: resolve_category(conn, required(sub, "category")?)?,
                interval: parse_enum(required(sub, "interval")?)?,
                next_date: parse_date(required(sub, "next-date")?)?,
            };
            let t = create_template(conn, template)?;
            println!(
                "Added {} {} {} (id {}), first on {}",
                t.interval, t.kind, t.amount, t.id, t.next_date
            );
        }
        Some(("edit", sub)) => {
            let mut patch = TemplatePatch {
                description: trimmed(sub.get_one::<String>("description")),
                is_active: sub.get_one::<bool>("active").copied(),
                ..TemplatePatch::default()
            };
            if let Some(raw) = sub.get_one::<String>("amount") {
                patch.amount = Some(parse_money(raw)?);
            }
            if let Some(raw) = sub.get_one::<String>("kind") {
                patch.kind = Some(parse_enum(raw)?);
            }
            if let Some(raw) = sub.get_one::<String>("category") {
                patch.category_id = Some(resolve_category(conn, raw)?);
            }
            if let Some(raw) = sub.get_one::<String>("interval") {
                patch.interval = Some(parse_enum(raw)?);
            }
            if let Some(raw) = sub.get_one::<String>("next-date") {
                patch.next_date = Some(parse_date(raw)?);
            }
            let t = update_template(conn, id_of(sub)?, patch)?;
            println!(
                "Updated recurring {}: {} {} {}, next on {}{}",
                t.id,
                t.interval,
                t.kind,
                t.amount,
                t.next_date,
                if t.is_active { "" } else { " (paused)" }
            );
        }
        Some(("list", sub)) => {
            let data = list_templates(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|t| {
                        vec![
                            t.id.to_string(),
                            t.kind.to_string(),
                            t.amount.to_string(),
                            t.interval.to_string(),
                            t.next_date.to_string(),
                            opt_text(&t.description),
                            if t.is_active { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Kind", "Amount", "Interval", "Next", "Description", "Active"],
                        rows
                    )
                );
            }
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            get_recurring(conn, id)?;
            conn.execute("DELETE FROM recurring_transactions WHERE id=?1", params![id])?;
            println!("Removed recurring transaction {}", id);
        }
        Some(("run", sub)) => {
            let as_of = match sub.get_one::<String>("as-of") {
                Some(raw) => parse_date(raw)?,
                None => today(),
            };
            let report = run_recurring_generation(conn, as_of)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
                println!(
                    "Created {} transaction(s) from {} due template(s){}",
                    report.created,
                    report.scanned,
                    if report.limit_reached {
                        "; limit reached, run again to continue"
                    } else {
                        ""
                    }
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub amount: Decimal,
    pub kind: TxKind,
    pub description: Option<String>,
    pub category_id: i64,
    pub interval: Interval,
    pub next_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub amount: Option<Decimal>,
    pub kind: Option<TxKind>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub interval: Option<Interval>,
    pub next_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// The schedule is anchored on the day of `next_date`.
pub fn create_template(conn: &Connection, new: NewTemplate) -> LedgerResult<RecurringTemplate> {
    let amount = money(new.amount);
    check_amount(amount)?;
    ensure_exists(conn, "categories", "Category", new.category_id)?;
    conn.execute(
        "INSERT INTO recurring_transactions(amount, kind, description, category_id, interval, next_date, anchor_day, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
        params![
            amount.to_string(),
            new.kind,
            new.description,
            new.category_id,
            new.interval,
            new.next_date,
            new.next_date.day()
        ],
    )?;
    let t = get_recurring(conn, conn.last_insert_rowid())?;
    tracing::info!(id = t.id, interval = %t.interval, next = %t.next_date, "recurring template created");
    Ok(t)
}

/// A new `next_date` re-anchors the schedule on its day of month.
pub fn update_template(conn: &mut Connection, id: i64, patch: TemplatePatch) -> LedgerResult<RecurringTemplate> {
    let amount = patch.amount.map(money);
    if let Some(a) = amount {
        check_amount(a)?;
    }
    atomically(conn, |tx| {
        let cur = get_recurring(tx, id)?;
        let category_id = patch.category_id.unwrap_or(cur.category_id);
        ensure_exists(tx, "categories", "Category", category_id)?;
        let next_date = patch.next_date.unwrap_or(cur.next_date);
        let anchor_day = match patch.next_date {
            Some(d) => d.day(),
            None => cur.anchor_day,
        };
        tx.execute(
            "UPDATE recurring_transactions
             SET amount=?1, kind=?2, description=?3, category_id=?4, interval=?5, next_date=?6, anchor_day=?7, is_active=?8
             WHERE id=?9",
            params![
                amount.unwrap_or(cur.amount).to_string(),
                patch.kind.unwrap_or(cur.kind),
                patch.description.or(cur.description),
                category_id,
                patch.interval.unwrap_or(cur.interval),
                next_date,
                anchor_day,
                patch.is_active.unwrap_or(cur.is_active),
                id
            ],
        )?;
        get_recurring(tx, id)
    })
}

pub fn list_templates(conn: &Connection) -> LedgerResult<Vec<RecurringTemplate>> {
    let sql = format!(
        "SELECT {} FROM recurring_transactions ORDER BY is_active DESC, next_date, id",
        RECURRING_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], recurring_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
