// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_of, parse_enum, required};
use crate::balance::{account_balance, snapshot};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{self, atomically};
use crate::models::{Account, AccountType};
use crate::store::{account_from_row, get_account, is_referenced, ACCOUNT_COLS};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required(sub, "name")?.trim().to_string();
            if name.is_empty() {
                bail!("Account name cannot be empty");
            }
            let typ: AccountType = parse_enum(required(sub, "type")?)?;
            let acct = create_account(conn, &name, typ)?;
            println!(
                "Added account '{}' ({}){}",
                acct.name,
                acct.r#type,
                if acct.is_default { " as default" } else { "" }
            );
        }
        Some(("edit", sub)) => {
            let id = id_of(sub)?;
            let name = sub
                .get_one::<String>("name")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let typ = match sub.get_one::<String>("type") {
                Some(raw) => Some(parse_enum::<AccountType>(raw)?),
                None => None,
            };
            let acct = update_account(conn, id, name, typ)?;
            println!("Updated account {} '{}' ({})", acct.id, acct.name, acct.r#type);
        }
        Some(("set-default", sub)) => {
            let acct = set_default(conn, id_of(sub)?)?;
            println!("'{}' is now the default account", acct.name);
        }
        Some(("list", sub)) => {
            let data = list_accounts(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.r#type.to_string(),
                            if a.is_default { "*".into() } else { String::new() },
                            a.balance.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Type", "Default", "Balance"], rows)
                );
            }
        }
        Some(("balance", sub)) => {
            let id = id_of(sub)?;
            println!("{}", ledger::account_balance(conn, id)?);
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            delete_account(conn, id)?;
            println!("Removed account {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AccountRow {
    pub id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub is_default: bool,
    pub balance: Decimal,
}

/// Adds an account. The first account ever created becomes the default.
pub fn create_account(conn: &mut Connection, name: &str, r#type: AccountType) -> LedgerResult<Account> {
    atomically(conn, |tx| {
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
        tx.execute(
            "INSERT INTO accounts(name, type, is_default) VALUES (?1, ?2, ?3)",
            params![name, r#type, existing == 0],
        )?;
        let acct = get_account(tx, tx.last_insert_rowid())?;
        tracing::info!(id = acct.id, default = acct.is_default, "account created");
        Ok(acct)
    })
}

pub fn update_account(
    conn: &mut Connection,
    id: i64,
    name: Option<String>,
    r#type: Option<AccountType>,
) -> LedgerResult<Account> {
    atomically(conn, |tx| {
        let cur = get_account(tx, id)?;
        tx.execute(
            "UPDATE accounts SET name=?1, type=?2 WHERE id=?3",
            params![name.unwrap_or(cur.name), r#type.unwrap_or(cur.r#type), id],
        )?;
        get_account(tx, id)
    })
}

/// Makes `id` the only default account.
pub fn set_default(conn: &mut Connection, id: i64) -> LedgerResult<Account> {
    atomically(conn, |tx| {
        get_account(tx, id)?;
        tx.execute(
            "UPDATE accounts SET is_default = (id = ?1)",
            params![id],
        )?;
        tracing::info!(id, "default account changed");
        get_account(tx, id)
    })
}

pub fn delete_account(conn: &mut Connection, id: i64) -> LedgerResult<()> {
    atomically(conn, |tx| {
        let acct = get_account(tx, id)?;
        if acct.is_default {
            return Err(LedgerError::DefaultAccount);
        }
        if is_referenced(tx, "transactions", "account_id", id)? {
            return Err(LedgerError::HasDependents {
                entity: "account",
                dependents: "transactions",
            });
        }
        if is_referenced(tx, "transfers", "from_account_id", id)?
            || is_referenced(tx, "transfers", "to_account_id", id)?
        {
            return Err(LedgerError::HasDependents {
                entity: "account",
                dependents: "transfers",
            });
        }
        tx.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
        tracing::info!(id, "account deleted");
        Ok(())
    })
}

/// All accounts with their balances, read from one snapshot.
pub fn list_accounts(conn: &Connection) -> LedgerResult<Vec<AccountRow>> {
    snapshot(conn, account_rows)
}

fn account_rows(conn: &Connection) -> LedgerResult<Vec<AccountRow>> {
    let sql = format!(
        "SELECT {} FROM accounts ORDER BY is_default DESC, name",
        ACCOUNT_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let accounts = stmt.query_map([], account_from_row)?;
    let mut out = Vec::new();
    for a in accounts {
        let a = a?;
        out.push(AccountRow {
            balance: account_balance(conn, a.id)?,
            id: a.id,
            name: a.name,
            r#type: a.r#type,
            is_default: a.is_default,
        });
    }
    Ok(out)
}
