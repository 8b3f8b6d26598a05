// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{required, resolve_account};
use crate::error::LedgerResult;
use crate::ledger::{apply_transfer, NewTransfer};
use crate::utils::{decimal_col, maybe_print_json, opt_text, parse_date, parse_money, pretty_table, today, trimmed};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let from_account_id = resolve_account(conn, required(sub, "from")?)?;
            let to_account_id = resolve_account(conn, required(sub, "to")?)?;
            let date = match sub.get_one::<String>("date") {
                Some(raw) => parse_date(raw)?,
                None => today(),
            };
            let t = apply_transfer(
                conn,
                NewTransfer {
                    from_account_id,
                    to_account_id,
                    amount: parse_money(required(sub, "amount")?)?,
                    date,
                    note: trimmed(sub.get_one::<String>("note")),
                },
            )?;
            println!(
                "Transferred {} from account {} to account {}",
                t.amount, t.from_account_id, t.to_account_id
            );
        }
        Some(("list", sub)) => {
            let data = list_transfers(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|t| {
                        vec![
                            t.id.to_string(),
                            t.date.to_string(),
                            t.from_account.clone(),
                            t.to_account.clone(),
                            t.amount.to_string(),
                            opt_text(&t.note),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Date", "From", "To", "Amount", "Note"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransferRow {
    pub id: i64,
    pub date: NaiveDate,
    pub from_account: String,
    pub to_account: String,
    pub amount: Decimal,
    pub note: Option<String>,
}

pub fn list_transfers(conn: &Connection) -> LedgerResult<Vec<TransferRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.date, f.name, d.name, t.amount, t.note FROM transfers t
         JOIN accounts f ON t.from_account_id=f.id
         JOIN accounts d ON t.to_account_id=d.id
         ORDER BY t.date DESC, t.id DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(TransferRow {
            id: r.get(0)?,
            date: r.get(1)?,
            from_account: r.get(2)?,
            to_account: r.get(3)?,
            amount: decimal_col(r, 4)?,
            note: r.get(5)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
