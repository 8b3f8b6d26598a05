// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance-guarded ledger operations.
//!
//! Every mutation runs in [`atomically`]: the SQLite write lock is taken
//! before the balance is read, so no other writer can commit between the
//! guard's check and the dependent write. A rejected or failed operation
//! drops its unit of work uncommitted and leaves the ledger untouched.

use crate::allocation::{self, Allocation};
use crate::balance;
use crate::error::LedgerResult;
use crate::guard;
use crate::models::{Goal, Transaction, Transfer, TxKind};
use crate::recurring::{self, GenerationReport, MAX_TRANSACTIONS_PER_RUN};
use crate::store;
use crate::utils::{money, today};
use chrono::NaiveDate;
use rusqlite::{params, Connection, TransactionBehavior};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub kind: TxKind,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub category_id: i64,
    pub account_id: Option<i64>,
}

/// Fields to change on an existing transaction; `None` keeps the stored value.
/// `account_id: Some(None)` detaches the transaction from its account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub kind: Option<TxKind>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub account_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOp {
    Create(NewTransaction),
    Update { id: i64, patch: TransactionPatch },
    Delete { id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// Runs `f` inside one immediate SQLite transaction and commits only if it
/// succeeds. Lock waits are bounded by the connection's busy timeout and
/// surface as [`crate::error::LedgerError::Busy`].
pub fn atomically<T, F>(conn: &mut Connection, f: F) -> LedgerResult<T>
where
    F: FnOnce(&rusqlite::Transaction<'_>) -> LedgerResult<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match f(&tx) {
        Ok(out) => {
            tx.commit()?;
            Ok(out)
        }
        Err(err) => {
            tracing::warn!(error = %err, "ledger mutation rejected");
            Err(err)
        }
    }
}

pub fn available_balance(conn: &Connection) -> LedgerResult<Decimal> {
    balance::available_balance(conn)
}

pub fn account_balance(conn: &Connection, account_id: i64) -> LedgerResult<Decimal> {
    balance::snapshot(conn, |conn| {
        store::ensure_exists(conn, "accounts", "Account", account_id)?;
        balance::account_balance(conn, account_id)
    })
}

fn check_references(conn: &Connection, category_id: i64, account_id: Option<i64>) -> LedgerResult<()> {
    store::ensure_exists(conn, "categories", "Category", category_id)?;
    if let Some(acct) = account_id {
        store::ensure_exists(conn, "accounts", "Account", acct)?;
    }
    Ok(())
}

fn create_transaction(conn: &Connection, new: NewTransaction) -> LedgerResult<Transaction> {
    let amount = money(new.amount);
    guard::check_amount(amount)?;
    check_references(conn, new.category_id, new.account_id)?;
    let available = balance::available_balance(conn)?;
    guard::check_create(new.kind, amount, available)?;

    conn.execute(
        "INSERT INTO transactions(amount, kind, description, date, category_id, account_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            amount.to_string(),
            new.kind,
            new.description,
            new.date,
            new.category_id,
            new.account_id
        ],
    )?;
    let created = store::get_transaction(conn, conn.last_insert_rowid())?;
    tracing::info!(id = created.id, kind = %created.kind, amount = %created.amount, "transaction recorded");
    Ok(created)
}

fn update_transaction(conn: &Connection, id: i64, patch: TransactionPatch) -> LedgerResult<Transaction> {
    let existing = store::get_transaction(conn, id)?;
    let new_amount = money(patch.amount.unwrap_or(existing.amount));
    let new_kind = patch.kind.unwrap_or(existing.kind);
    guard::check_amount(new_amount)?;
    let category_id = patch.category_id.unwrap_or(existing.category_id);
    let account_id = patch.account_id.unwrap_or(existing.account_id);
    check_references(conn, category_id, account_id)?;

    let available = balance::available_balance(conn)?;
    guard::check_update(&existing, new_kind, new_amount, available)?;

    conn.execute(
        "UPDATE transactions SET amount=?1, kind=?2, description=?3, date=?4, category_id=?5, account_id=?6
         WHERE id=?7",
        params![
            new_amount.to_string(),
            new_kind,
            patch.description.or(existing.description),
            patch.date.unwrap_or(existing.date),
            category_id,
            account_id,
            id
        ],
    )?;
    let updated = store::get_transaction(conn, id)?;
    tracing::info!(id, kind = %updated.kind, amount = %updated.amount, "transaction updated");
    Ok(updated)
}

fn delete_transaction(conn: &Connection, id: i64) -> LedgerResult<Transaction> {
    let existing = store::get_transaction(conn, id)?;
    let available = balance::available_balance(conn)?;
    guard::check_delete(&existing, available)?;
    conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    tracing::info!(id, kind = %existing.kind, amount = %existing.amount, "transaction deleted");
    Ok(existing)
}

/// Creates, updates or deletes a transaction under the balance invariant.
/// A delete returns the row as it was before removal.
pub fn apply_transaction_mutation(conn: &mut Connection, op: TransactionOp) -> LedgerResult<Transaction> {
    atomically(conn, |tx| match op {
        TransactionOp::Create(new) => create_transaction(tx, new),
        TransactionOp::Update { id, patch } => update_transaction(tx, id, patch),
        TransactionOp::Delete { id } => delete_transaction(tx, id),
    })
}

/// Moves money between two accounts. Only the source account balance is
/// checked; the global available balance is unaffected.
pub fn apply_transfer(conn: &mut Connection, new: NewTransfer) -> LedgerResult<Transfer> {
    let amount = money(new.amount);
    atomically(conn, |tx| {
        guard::check_transfer_shape(new.from_account_id, new.to_account_id, amount)?;
        store::ensure_exists(tx, "accounts", "Account", new.from_account_id)?;
        store::ensure_exists(tx, "accounts", "Account", new.to_account_id)?;
        let from_balance = balance::account_balance(tx, new.from_account_id)?;
        guard::check_transfer_funds(amount, from_balance)?;

        tx.execute(
            "INSERT INTO transfers(from_account_id, to_account_id, amount, date, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.from_account_id,
                new.to_account_id,
                amount.to_string(),
                new.date,
                new.note
            ],
        )?;
        let transfer = store::get_transfer(tx, tx.last_insert_rowid())?;
        tracing::info!(
            id = transfer.id,
            from = transfer.from_account_id,
            to = transfer.to_account_id,
            amount = %transfer.amount,
            "transfer recorded"
        );
        Ok(transfer)
    })
}

/// Records a contribution and keeps the goal's `current_amount` equal to the
/// sum of its contributions. Dated today unless `date` is given.
pub fn apply_goal_contribution(
    conn: &mut Connection,
    goal_id: i64,
    amount: Decimal,
    note: Option<String>,
    date: Option<NaiveDate>,
) -> LedgerResult<Goal> {
    let amount = money(amount);
    atomically(conn, |tx| {
        guard::check_amount(amount)?;
        let mut goal = store::get_goal(tx, goal_id)?;
        let available = balance::available_balance(tx)?;
        guard::check_contribution(&goal, amount, available)?;

        tx.execute(
            "INSERT INTO goal_contributions(goal_id, amount, date, note) VALUES (?1, ?2, ?3, ?4)",
            params![goal_id, amount.to_string(), date.unwrap_or_else(today), note],
        )?;
        let was_completed = goal.completed;
        guard::apply_contribution(&mut goal, amount);
        tx.execute(
            "UPDATE goals SET current_amount=?1, completed=?2 WHERE id=?3",
            params![goal.current_amount.to_string(), goal.completed, goal_id],
        )?;
        tracing::info!(goal_id, amount = %amount, current = %goal.current_amount, "goal contribution recorded");
        if goal.completed && !was_completed {
            tracing::info!(goal_id, "goal completed");
        }
        store::get_goal(tx, goal_id)
    })
}

/// Materializes due recurring transactions up to `as_of`, at most
/// [`MAX_TRANSACTIONS_PER_RUN`] per call. Bypasses the balance guard.
pub fn run_recurring_generation(conn: &mut Connection, as_of: NaiveDate) -> LedgerResult<GenerationReport> {
    atomically(conn, |tx| recurring::generate(tx, as_of, MAX_TRANSACTIONS_PER_RUN))
}

/// Splits `base_amount` across the active allocation rules. Read-only.
pub fn plan_allocation(conn: &Connection, base_amount: Decimal) -> LedgerResult<Vec<Allocation>> {
    let rules = allocation::active_rules(conn)?;
    let mut names = HashMap::new();
    for r in &rules {
        let name = allocation::target_name(conn, r.target_type, r.target_id)?;
        names.insert((r.target_type, r.target_id), name.unwrap_or_default());
    }
    Ok(allocation::plan(money(base_amount), &rules, |t, id| {
        names.get(&(t, id)).cloned().unwrap_or_default()
    }))
}
