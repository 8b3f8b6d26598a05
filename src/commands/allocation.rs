// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_of, parse_enum, required};
use crate::allocation::target_name;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{atomically, plan_allocation};
use crate::models::{AllocationRule, TargetType};
use crate::store::{get_rule, rule_from_row, RULE_COLS};
use crate::utils::{maybe_print_json, parse_money, pretty_table, trimmed};
use anyhow::{anyhow, bail, Result};
use rusqlite::{params, Connection};
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let Some(name) = trimmed(sub.get_one::<String>("name")) else {
                bail!("Rule name cannot be empty");
            };
            let rule = NewRule {
                name,
                percentage: *sub
                    .get_one::<i64>("percentage")
                    .ok_or_else(|| anyhow!("missing required argument --percentage"))?,
                target_type: parse_enum(required(sub, "target-type")?)?,
                target_id: *sub
                    .get_one::<i64>("target-id")
                    .ok_or_else(|| anyhow!("missing required argument --target-id"))?,
                sort_order: sub.get_one::<i64>("sort-order").copied().unwrap_or(0),
            };
            let r = create_rule(conn, rule)?;
            println!(
                "Added rule '{}': {}% to {} {}",
                r.name, r.percentage, r.target_type, r.target_id
            );
        }
        Some(("edit", sub)) => {
            let target_type = match sub.get_one::<String>("target-type") {
                Some(raw) => Some(parse_enum::<TargetType>(raw)?),
                None => None,
            };
            let patch = RulePatch {
                name: trimmed(sub.get_one::<String>("name")),
                percentage: sub.get_one::<i64>("percentage").copied(),
                target_type,
                target_id: sub.get_one::<i64>("target-id").copied(),
                sort_order: sub.get_one::<i64>("sort-order").copied(),
                is_active: sub.get_one::<bool>("active").copied(),
            };
            let r = update_rule(conn, id_of(sub)?, patch)?;
            println!("Updated rule {} '{}'", r.id, r.name);
        }
        Some(("list", sub)) => {
            let data = list_rules(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        vec![
                            r.rule.id.to_string(),
                            r.rule.name.clone(),
                            format!("{}%", r.rule.percentage),
                            format!("{} {}", r.rule.target_type, r.rule.target_id),
                            r.target_name.clone().unwrap_or_else(|| "(missing)".into()),
                            r.rule.sort_order.to_string(),
                            if r.rule.is_active { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Share", "Target", "Target Name", "Order", "Active"],
                        rows
                    )
                );
            }
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            get_rule(conn, id)?;
            conn.execute("DELETE FROM allocation_rules WHERE id=?1", params![id])?;
            println!("Removed rule {}", id);
        }
        Some(("plan", sub)) => {
            let base = parse_money(required(sub, "amount")?)?;
            let data = plan_allocation(conn, base)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|a| {
                        vec![
                            a.rule_name.clone(),
                            format!("{}%", a.percentage),
                            format!("{} '{}'", a.target_type, a.target_name),
                            a.amount.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Rule", "Share", "Target", "Amount"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewRule {
    pub name: String,
    pub percentage: i64,
    pub target_type: TargetType,
    pub target_id: i64,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default)]
pub struct RulePatch {
    pub name: Option<String>,
    pub percentage: Option<i64>,
    pub target_type: Option<TargetType>,
    pub target_id: Option<i64>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RuleRow {
    #[serde(flatten)]
    pub rule: AllocationRule,
    pub target_name: Option<String>,
}

fn check_percentage(pct: i64) -> LedgerResult<u32> {
    u32::try_from(pct)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or(LedgerError::InvalidPercentage(pct))
}

fn check_target(conn: &Connection, target_type: TargetType, target_id: i64) -> LedgerResult<()> {
    match target_name(conn, target_type, target_id)? {
        Some(_) => Ok(()),
        None => Err(LedgerError::InvalidTarget {
            target_type: target_type.to_string(),
            target_id,
        }),
    }
}

pub fn create_rule(conn: &Connection, new: NewRule) -> LedgerResult<AllocationRule> {
    let percentage = check_percentage(new.percentage)?;
    check_target(conn, new.target_type, new.target_id)?;
    conn.execute(
        "INSERT INTO allocation_rules(name, percentage, target_type, target_id, is_active, sort_order)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        params![new.name, percentage, new.target_type, new.target_id, new.sort_order],
    )?;
    get_rule(conn, conn.last_insert_rowid())
}

pub fn update_rule(conn: &mut Connection, id: i64, patch: RulePatch) -> LedgerResult<AllocationRule> {
    let percentage = patch.percentage.map(check_percentage).transpose()?;
    atomically(conn, |tx| {
        let cur = get_rule(tx, id)?;
        let target_type = patch.target_type.unwrap_or(cur.target_type);
        let target_id = patch.target_id.unwrap_or(cur.target_id);
        if patch.target_type.is_some() || patch.target_id.is_some() {
            check_target(tx, target_type, target_id)?;
        }
        tx.execute(
            "UPDATE allocation_rules
             SET name=?1, percentage=?2, target_type=?3, target_id=?4, sort_order=?5, is_active=?6
             WHERE id=?7",
            params![
                patch.name.unwrap_or(cur.name),
                percentage.unwrap_or(cur.percentage),
                target_type,
                target_id,
                patch.sort_order.unwrap_or(cur.sort_order),
                patch.is_active.unwrap_or(cur.is_active),
                id
            ],
        )?;
        get_rule(tx, id)
    })
}

/// All rules, active or not, with the current name of each target.
pub fn list_rules(conn: &Connection) -> LedgerResult<Vec<RuleRow>> {
    let sql = format!("SELECT {} FROM allocation_rules ORDER BY sort_order, id", RULE_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rules = stmt.query_map([], rule_from_row)?;
    let mut out = Vec::new();
    for r in rules {
        let rule = r?;
        out.push(RuleRow {
            target_name: target_name(conn, rule.target_type, rule.target_id)?,
            rule,
        });
    }
    Ok(out)
}
