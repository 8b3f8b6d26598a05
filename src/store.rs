// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row mapping and lookups shared by the engine and the command handlers.
//!
//! Every function takes a plain `&Connection`; an open
//! `rusqlite::Transaction` derefs to one, so the same readers serve both
//! ad-hoc queries and reads inside a unit of work.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AllocationRule, Budget, Category, Goal, GoalContribution, RecurringTemplate,
    Transaction, Transfer,
};
use crate::utils::decimal_col;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub const TRANSACTION_COLS: &str =
    "id, amount, kind, description, date, category_id, account_id, created_at";
pub const TRANSFER_COLS: &str =
    "id, from_account_id, to_account_id, amount, date, note, created_at";
pub const GOAL_COLS: &str =
    "id, name, target_amount, current_amount, deadline, completed, created_at";
pub const CONTRIBUTION_COLS: &str = "id, goal_id, amount, date, note, created_at";
pub const ACCOUNT_COLS: &str = "id, name, type, is_default, created_at";
pub const CATEGORY_COLS: &str = "id, name, kind, icon, created_at";
pub const BUDGET_COLS: &str = "id, category_id, amount, month, year, created_at";
pub const RECURRING_COLS: &str =
    "id, amount, kind, description, category_id, interval, next_date, anchor_day, is_active, created_at";
pub const RULE_COLS: &str =
    "id, name, percentage, target_type, target_id, is_active, sort_order, created_at";

pub fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        amount: decimal_col(r, 1)?,
        kind: r.get(2)?,
        description: r.get(3)?,
        date: r.get(4)?,
        category_id: r.get(5)?,
        account_id: r.get(6)?,
        created_at: r.get(7)?,
    })
}

pub fn transfer_from_row(r: &Row<'_>) -> rusqlite::Result<Transfer> {
    Ok(Transfer {
        id: r.get(0)?,
        from_account_id: r.get(1)?,
        to_account_id: r.get(2)?,
        amount: decimal_col(r, 3)?,
        date: r.get(4)?,
        note: r.get(5)?,
        created_at: r.get(6)?,
    })
}

pub fn goal_from_row(r: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: r.get(0)?,
        name: r.get(1)?,
        target_amount: decimal_col(r, 2)?,
        current_amount: decimal_col(r, 3)?,
        deadline: r.get(4)?,
        completed: r.get(5)?,
        created_at: r.get(6)?,
    })
}

pub fn contribution_from_row(r: &Row<'_>) -> rusqlite::Result<GoalContribution> {
    Ok(GoalContribution {
        id: r.get(0)?,
        goal_id: r.get(1)?,
        amount: decimal_col(r, 2)?,
        date: r.get(3)?,
        note: r.get(4)?,
        created_at: r.get(5)?,
    })
}

pub fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        r#type: r.get(2)?,
        is_default: r.get(3)?,
        created_at: r.get(4)?,
    })
}

pub fn category_from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: r.get(2)?,
        icon: r.get(3)?,
        created_at: r.get(4)?,
    })
}

pub fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        category_id: r.get(1)?,
        amount: decimal_col(r, 2)?,
        month: r.get(3)?,
        year: r.get(4)?,
        created_at: r.get(5)?,
    })
}

pub fn recurring_from_row(r: &Row<'_>) -> rusqlite::Result<RecurringTemplate> {
    Ok(RecurringTemplate {
        id: r.get(0)?,
        amount: decimal_col(r, 1)?,
        kind: r.get(2)?,
        description: r.get(3)?,
        category_id: r.get(4)?,
        interval: r.get(5)?,
        next_date: r.get(6)?,
        anchor_day: r.get(7)?,
        is_active: r.get(8)?,
        created_at: r.get(9)?,
    })
}

pub fn rule_from_row(r: &Row<'_>) -> rusqlite::Result<AllocationRule> {
    Ok(AllocationRule {
        id: r.get(0)?,
        name: r.get(1)?,
        percentage: r.get(2)?,
        target_type: r.get(3)?,
        target_id: r.get(4)?,
        is_active: r.get(5)?,
        sort_order: r.get(6)?,
        created_at: r.get(7)?,
    })
}

macro_rules! getter {
    ($fn_name:ident, $ty:ty, $table:literal, $cols:ident, $mapper:ident, $entity:literal) => {
        pub fn $fn_name(conn: &Connection, id: i64) -> LedgerResult<$ty> {
            let sql = format!("SELECT {} FROM {} WHERE id=?1", $cols, $table);
            conn.query_row(&sql, params![id], $mapper)
                .optional()?
                .ok_or_else(|| LedgerError::not_found($entity, id))
        }
    };
}

getter!(get_transaction, Transaction, "transactions", TRANSACTION_COLS, transaction_from_row, "Transaction");
getter!(get_transfer, Transfer, "transfers", TRANSFER_COLS, transfer_from_row, "Transfer");
getter!(get_goal, Goal, "goals", GOAL_COLS, goal_from_row, "Goal");
getter!(get_account, Account, "accounts", ACCOUNT_COLS, account_from_row, "Account");
getter!(get_category, Category, "categories", CATEGORY_COLS, category_from_row, "Category");
getter!(get_budget, Budget, "budgets", BUDGET_COLS, budget_from_row, "Budget");
getter!(get_recurring, RecurringTemplate, "recurring_transactions", RECURRING_COLS, recurring_from_row, "Recurring transaction");
getter!(get_rule, AllocationRule, "allocation_rules", RULE_COLS, rule_from_row, "Allocation rule");

/// Fails with `NotFound` unless a row with `id` exists in `table`.
pub fn ensure_exists(conn: &Connection, table: &str, entity: &'static str, id: i64) -> LedgerResult<()> {
    let sql = format!("SELECT 1 FROM {} WHERE id=?1", table);
    let hit: Option<i64> = conn.query_row(&sql, params![id], |r| r.get(0)).optional()?;
    hit.map(|_| ()).ok_or_else(|| LedgerError::not_found(entity, id))
}

/// Whether any row of `table` has `column = id`.
pub fn is_referenced(conn: &Connection, table: &str, column: &str, id: i64) -> LedgerResult<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE {}=?1 LIMIT 1", table, column);
    let hit: Option<i64> = conn.query_row(&sql, params![id], |r| r.get(0)).optional()?;
    Ok(hit.is_some())
}

pub fn id_for_account(conn: &Connection, name: &str) -> LedgerResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM accounts WHERE name=?1 ORDER BY id LIMIT 1",
            params![name.trim()],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn id_for_category(conn: &Connection, name: &str) -> LedgerResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM categories WHERE name=?1",
            params![name.trim()],
            |r| r.get(0),
        )
        .optional()?)
}
