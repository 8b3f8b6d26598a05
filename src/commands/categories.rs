// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_of, parse_enum, required};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::atomically;
use crate::models::{Category, TxKind};
use crate::store::{category_from_row, get_category, is_referenced, CATEGORY_COLS};
use crate::utils::{maybe_print_json, opt_text, pretty_table, trimmed};
use anyhow::{bail, Result};
use rusqlite::{params, Connection};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let Some(name) = trimmed(sub.get_one::<String>("name")) else {
                bail!("Category name cannot be empty");
            };
            let kind: TxKind = parse_enum(required(sub, "kind")?)?;
            let cat = create_category(conn, &name, kind, trimmed(sub.get_one::<String>("icon")))?;
            println!("Added category '{}' ({})", cat.name, cat.kind);
        }
        Some(("edit", sub)) => {
            let kind = match sub.get_one::<String>("kind") {
                Some(raw) => Some(parse_enum::<TxKind>(raw)?),
                None => None,
            };
            let cat = update_category(
                conn,
                id_of(sub)?,
                trimmed(sub.get_one::<String>("name")),
                kind,
                trimmed(sub.get_one::<String>("icon")),
            )?;
            println!("Updated category {} '{}'", cat.id, cat.name);
        }
        Some(("list", sub)) => {
            let data = list_categories(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.kind.to_string(),
                            opt_text(&c.icon),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Kind", "Icon"], rows));
            }
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            delete_category(conn, id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}

pub fn create_category(
    conn: &Connection,
    name: &str,
    kind: TxKind,
    icon: Option<String>,
) -> LedgerResult<Category> {
    conn.execute(
        "INSERT INTO categories(name, kind, icon) VALUES (?1, ?2, ?3)",
        params![name, kind, icon],
    )?;
    get_category(conn, conn.last_insert_rowid())
}

pub fn update_category(
    conn: &Connection,
    id: i64,
    name: Option<String>,
    kind: Option<TxKind>,
    icon: Option<String>,
) -> LedgerResult<Category> {
    let cur = get_category(conn, id)?;
    conn.execute(
        "UPDATE categories SET name=?1, kind=?2, icon=?3 WHERE id=?4",
        params![
            name.unwrap_or(cur.name),
            kind.unwrap_or(cur.kind),
            icon.or(cur.icon),
            id
        ],
    )?;
    get_category(conn, id)
}

/// Deletes a category nothing refers to.
pub fn delete_category(conn: &mut Connection, id: i64) -> LedgerResult<()> {
    atomically(conn, |tx| {
        get_category(tx, id)?;
        for (table, dependents) in [
            ("transactions", "transactions"),
            ("budgets", "budgets"),
            ("recurring_transactions", "recurring transactions"),
        ] {
            if is_referenced(tx, table, "category_id", id)? {
                return Err(LedgerError::HasDependents {
                    entity: "category",
                    dependents,
                });
            }
        }
        tx.execute("DELETE FROM categories WHERE id=?1", params![id])?;
        tracing::info!(id, "category deleted");
        Ok(())
    })
}

pub fn list_categories(conn: &Connection) -> LedgerResult<Vec<Category>> {
    let sql = format!("SELECT {} FROM categories ORDER BY kind, name", CATEGORY_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], category_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
