// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_of, required};
use crate::error::LedgerResult;
use crate::guard::check_amount;
use crate::ledger::{apply_goal_contribution, atomically};
use crate::models::{Goal, GoalContribution};
use crate::store::{contribution_from_row, get_goal, goal_from_row, CONTRIBUTION_COLS, GOAL_COLS};
use crate::utils::{maybe_print_json, money, opt_text, parse_date, parse_money, pretty_table, trimmed};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let Some(name) = trimmed(sub.get_one::<String>("name")) else {
                bail!("Goal name cannot be empty");
            };
            let deadline = match sub.get_one::<String>("deadline") {
                Some(raw) => Some(parse_date(raw)?),
                None => None,
            };
            let goal = create_goal(conn, &name, parse_money(required(sub, "target")?)?, deadline)?;
            println!("Added goal '{}' with target {}", goal.name, goal.target_amount);
        }
        Some(("edit", sub)) => {
            let target = match sub.get_one::<String>("target") {
                Some(raw) => Some(parse_money(raw)?),
                None => None,
            };
            let deadline = match sub.get_one::<String>("deadline") {
                Some(raw) => Some(parse_date(raw)?),
                None => None,
            };
            let goal = update_goal(
                conn,
                id_of(sub)?,
                trimmed(sub.get_one::<String>("name")),
                target,
                deadline,
            )?;
            println!(
                "Updated goal {} '{}': {}/{}{}",
                goal.id,
                goal.name,
                goal.current_amount,
                goal.target_amount,
                if goal.completed { " (completed)" } else { "" }
            );
        }
        Some(("list", sub)) => {
            let data = list_goals(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|g| {
                        vec![
                            g.id.to_string(),
                            g.name.clone(),
                            g.current_amount.to_string(),
                            g.target_amount.to_string(),
                            format!("{}%", g.progress_percent()),
                            g.deadline.map(|d| d.to_string()).unwrap_or_default(),
                            if g.completed { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Saved", "Target", "Progress", "Deadline", "Done"],
                        rows
                    )
                );
            }
        }
        Some(("contribute", sub)) => {
            let date = match sub.get_one::<String>("date") {
                Some(raw) => Some(parse_date(raw)?),
                None => None,
            };
            let goal = apply_goal_contribution(
                conn,
                id_of(sub)?,
                parse_money(required(sub, "amount")?)?,
                trimmed(sub.get_one::<String>("note")),
                date,
            )?;
            println!(
                "'{}' now at {}/{}{}",
                goal.name,
                goal.current_amount,
                goal.target_amount,
                if goal.completed { " - goal completed!" } else { "" }
            );
        }
        Some(("history", sub)) => {
            let data = contributions(conn, id_of(sub)?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| vec![c.id.to_string(), c.date.to_string(), c.amount.to_string(), opt_text(&c.note)])
                    .collect();
                println!("{}", pretty_table(&["ID", "Date", "Amount", "Note"], rows));
            }
        }
        Some(("rm", sub)) => {
            let id = id_of(sub)?;
            delete_goal(conn, id)?;
            println!("Removed goal {} and its contributions", id);
        }
        _ => {}
    }
    Ok(())
}

pub fn create_goal(
    conn: &Connection,
    name: &str,
    target: Decimal,
    deadline: Option<NaiveDate>,
) -> LedgerResult<Goal> {
    let target = money(target);
    check_amount(target)?;
    conn.execute(
        "INSERT INTO goals(name, target_amount, current_amount, deadline, completed)
         VALUES (?1, ?2, '0.00', ?3, 0)",
        params![name, target.to_string(), deadline],
    )?;
    get_goal(conn, conn.last_insert_rowid())
}

/// Edits a goal. Lowering the target to or below the saved amount marks it
/// completed; raising it again never clears the flag.
pub fn update_goal(
    conn: &mut Connection,
    id: i64,
    name: Option<String>,
    target: Option<Decimal>,
    deadline: Option<NaiveDate>,
) -> LedgerResult<Goal> {
    let target = target.map(money);
    if let Some(t) = target {
        check_amount(t)?;
    }
    atomically(conn, |tx| {
        let cur = get_goal(tx, id)?;
        let target = target.unwrap_or(cur.target_amount);
        let completed = cur.completed || cur.current_amount >= target;
        tx.execute(
            "UPDATE goals SET name=?1, target_amount=?2, deadline=?3, completed=?4 WHERE id=?5",
            params![
                name.unwrap_or(cur.name),
                target.to_string(),
                deadline.or(cur.deadline),
                completed,
                id
            ],
        )?;
        if completed && !cur.completed {
            tracing::info!(goal_id = id, "goal completed");
        }
        get_goal(tx, id)
    })
}

pub fn list_goals(conn: &Connection) -> LedgerResult<Vec<Goal>> {
    let sql = format!("SELECT {} FROM goals ORDER BY completed, id", GOAL_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], goal_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn contributions(conn: &Connection, goal_id: i64) -> LedgerResult<Vec<GoalContribution>> {
    get_goal(conn, goal_id)?;
    let sql = format!(
        "SELECT {} FROM goal_contributions WHERE goal_id=?1 ORDER BY date DESC, id DESC",
        CONTRIBUTION_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![goal_id], contribution_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Deleting a goal drops its contributions, which returns their amounts to
/// the available balance.
pub fn delete_goal(conn: &mut Connection, id: i64) -> LedgerResult<()> {
    atomically(conn, |tx| {
        get_goal(tx, id)?;
        tx.execute("DELETE FROM goals WHERE id=?1", params![id])?;
        tracing::info!(goal_id = id, "goal deleted");
        Ok(())
    })
}
