// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::error::LedgerResult;
use crate::models::Setting;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Prefix shown before every formatted amount.
pub const CURRENCY_SYMBOL_KEY: &str = "currency_symbol";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = required(sub, "key")?.trim();
            match get_setting(conn, key)? {
                Some(v) => println!("{}", v),
                None => bail!("Setting '{}' is not set", key),
            }
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?.trim();
            if key.is_empty() {
                bail!("Setting key cannot be empty");
            }
            let value = required(sub, "value")?;
            set_setting(conn, key, value)?;
            println!("{} = {}", key, value);
        }
        Some(("list", sub)) => {
            let data = list_settings(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|s| vec![s.key.clone(), s.value.clone()])
                    .collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn get_setting(conn: &Connection, key: &str) -> LedgerResult<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> LedgerResult<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_settings(conn: &Connection) -> LedgerResult<Vec<Setting>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let rows = stmt.query_map([], |r| {
        Ok(Setting {
            key: r.get(0)?,
            value: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn currency_symbol(conn: &Connection) -> LedgerResult<String> {
    Ok(get_setting(conn, CURRENCY_SYMBOL_KEY)?.unwrap_or_default())
}
