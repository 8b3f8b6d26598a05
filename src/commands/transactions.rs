// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_of, parse_enum, required, resolve_account, resolve_category};
use crate::ledger::{apply_transaction_mutation, NewTransaction, TransactionOp, TransactionPatch};
use crate::models::TxKind;
use crate::utils::{decimal_col, maybe_print_json, parse_date, parse_money, pretty_table, today, trimmed};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let removed = apply_transaction_mutation(conn, TransactionOp::Delete { id: id_of(sub)? })?;
            println!(
                "Removed {} {} dated {}",
                removed.kind, removed.amount, removed.date
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_money(required(sub, "amount")?)?;
    let kind: TxKind = parse_enum(required(sub, "kind")?)?;
    let category_id = resolve_category(conn, required(sub, "category")?)?;
    let account_id = match sub.get_one::<String>("account") {
        Some(raw) => Some(resolve_account(conn, raw)?),
        None => None,
    };
    let date = match sub.get_one::<String>("date") {
        Some(raw) => parse_date(raw)?,
        None => today(),
    };
    let created = apply_transaction_mutation(
        conn,
        TransactionOp::Create(NewTransaction {
            amount,
            kind,
            description: trimmed(sub.get_one::<String>("description")),
            date,
            category_id,
            account_id,
        }),
    )?;
    println!(
        "Recorded {} {} on {} (id {})",
        created.kind, created.amount, created.date, created.id
    );
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_of(sub)?;
    let mut patch = TransactionPatch {
        description: trimmed(sub.get_one::<String>("description")),
        ..TransactionPatch::default()
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
    if let Some(raw) = sub.get_one::<String>("account") {
        patch.account_id = Some(Some(resolve_account(conn, raw)?));
    } else if sub.get_flag("no-account") {
        patch.account_id = Some(None);
    }
    if let Some(raw) = sub.get_one::<String>("date") {
        patch.date = Some(parse_date(raw)?);
    }
    let updated = apply_transaction_mutation(conn, TransactionOp::Update { id, patch })?;
    println!(
        "Updated transaction {}: {} {} on {}",
        updated.id, updated.kind, updated.amount, updated.date
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut filter = TransactionFilter {
        kind: match sub.get_one::<String>("kind") {
            Some(raw) => Some(parse_enum(raw)?),
            None => None,
        },
        from: match sub.get_one::<String>("from") {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        },
        to: match sub.get_one::<String>("to") {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        },
        ..TransactionFilter::default()
    };
    if let Some(raw) = sub.get_one::<String>("category") {
        filter.category_id = Some(resolve_category(conn, raw)?);
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        filter.limit = *limit;
    }
    if let Some(offset) = sub.get_one::<usize>("offset") {
        filter.offset = *offset;
    }

    let data = query_rows(conn, &filter)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.to_string(),
                    r.kind.to_string(),
                    r.amount.to_string(),
                    r.category.clone(),
                    r.account.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Amount", "Category", "Account", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub kind: Option<TxKind>,
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            kind: None,
            category_id: None,
            from: None,
            to: None,
            limit: 100,
            offset: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: NaiveDate,
    pub kind: TxKind,
    pub amount: Decimal,
    pub category: String,
    pub account: String,
    pub description: String,
}

/// Newest first; ties broken by id so paging is stable.
pub fn query_rows(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.kind, t.amount, c.name, a.name, t.description FROM transactions t LEFT JOIN categories c ON t.category_id=c.id LEFT JOIN accounts a ON t.account_id=a.id WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(kind) = filter.kind {
        sql.push_str(" AND t.kind=?");
        params_vec.push(Box::new(kind));
    }
    if let Some(cat) = filter.category_id {
        sql.push_str(" AND t.category_id=?");
        params_vec.push(Box::new(cat));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND t.date>=?");
        params_vec.push(Box::new(from));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND t.date<=?");
        params_vec.push(Box::new(to));
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC LIMIT ? OFFSET ?");
    params_vec.push(Box::new(filter.limit as i64));
    params_vec.push(Box::new(filter.offset as i64));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let category: Option<String> = r.get(4)?;
        let account: Option<String> = r.get(5)?;
        let description: Option<String> = r.get(6)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            kind: r.get(2)?,
            amount: decimal_col(r, 3)?,
            category: category.unwrap_or_default(),
            account: account.unwrap_or_default(),
            description: description.unwrap_or_default(),
        });
    }
    Ok(data)
}
