// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::commands::{budgets, categories};
use fintrack::db;
use fintrack::error::LedgerError;
use fintrack::ledger::{self, NewTransaction, TransactionOp};
use fintrack::models::TxKind;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn setup() -> (Connection, i64) {
    let mut conn = db::open_in_memory().unwrap();
    let salary = categories::create_category(&conn, "Salary", TxKind::Income, None).unwrap();
    let dining = categories::create_category(&conn, "Dining", TxKind::Expense, Some("🍜".into())).unwrap();
    let spend = |conn: &mut Connection, kind: TxKind, category_id: i64, amount: &str, date: (i32, u32, u32)| {
        ledger::apply_transaction_mutation(
            conn,
            TransactionOp::Create(NewTransaction {
                amount: d(amount),
                kind,
                description: None,
                date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                category_id,
                account_id: None,
            }),
        )
        .unwrap();
    };
    spend(&mut conn, TxKind::Income, salary.id, "500", (2025, 8, 1));
    spend(&mut conn, TxKind::Expense, dining.id, "12.40", (2025, 8, 3));
    spend(&mut conn, TxKind::Expense, dining.id, "7.60", (2025, 8, 31));
    spend(&mut conn, TxKind::Expense, dining.id, "99", (2025, 9, 1));
    (conn, dining.id)
}

#[test]
fn status_sums_expenses_of_the_month() {
    let (mut conn, dining) = setup();
    budgets::create_budget(&mut conn, dining, d("50"), 8, 2025).unwrap();
    let status = budgets::budget_status(&conn, 8, 2025).unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].category, "Dining");
    assert_eq!(status[0].spent.to_string(), "20.00");
    assert_eq!(status[0].remaining.to_string(), "30.00");
    assert!(budgets::budget_status(&conn, 7, 2025).unwrap().is_empty());
}

#[test]
fn one_budget_per_category_and_month() {
    let (mut conn, dining) = setup();
    budgets::create_budget(&mut conn, dining, d("50"), 8, 2025).unwrap();
    let err = budgets::create_budget(&mut conn, dining, d("80"), 8, 2025).unwrap_err();
    assert_eq!(
        err,
        LedgerError::DuplicatePeriod {
            category_id: dining,
            month: 8,
            year: 2025
        }
    );
    budgets::create_budget(&mut conn, dining, d("80"), 8, 2026).unwrap();
}

#[test]
fn moving_a_budget_onto_a_taken_month_is_rejected() {
    let (mut conn, dining) = setup();
    let aug = budgets::create_budget(&mut conn, dining, d("50"), 8, 2025).unwrap();
    budgets::create_budget(&mut conn, dining, d("50"), 9, 2025).unwrap();
    let err = budgets::update_budget(&mut conn, aug.id, None, Some(9), None).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicatePeriod { month: 9, .. }));

    let same = budgets::update_budget(&mut conn, aug.id, Some(d("65.5")), Some(8), None).unwrap();
    assert_eq!(same.amount.to_string(), "65.50");
}

#[test]
fn month_and_amount_are_validated() {
    let (mut conn, dining) = setup();
    assert_eq!(
        budgets::create_budget(&mut conn, dining, d("10"), 13, 2025).unwrap_err(),
        LedgerError::InvalidPeriod(13)
    );
    assert_eq!(
        budgets::create_budget(&mut conn, dining, d("10"), 0, 2025).unwrap_err(),
        LedgerError::InvalidPeriod(0)
    );
    assert!(matches!(
        budgets::create_budget(&mut conn, dining, d("0"), 1, 2025).unwrap_err(),
        LedgerError::InvalidAmount(_)
    ));
    assert_eq!(
        budgets::create_budget(&mut conn, 77, d("10"), 1, 2025).unwrap_err(),
        LedgerError::not_found("Category", 77)
    );
}

#[test]
fn category_with_budget_cannot_be_deleted() {
    let mut conn = db::open_in_memory().unwrap();
    let cat = categories::create_category(&conn, "Travel", TxKind::Expense, None).unwrap();
    budgets::create_budget(&mut conn, cat.id, d("100"), 1, 2025).unwrap();
    assert_eq!(
        categories::delete_category(&mut conn, cat.id).unwrap_err(),
        LedgerError::HasDependents {
            entity: "category",
            dependents: "budgets"
        }
    );
}

#[test]
fn category_referenced_by_transactions_cannot_be_deleted() {
    let (mut conn, dining) = setup();
    let err = categories::delete_category(&mut conn, dining).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::HasDependents {
            dependents: "transactions",
            ..
        }
    ));
    let unused = categories::create_category(&conn, "Misc", TxKind::Expense, None).unwrap();
    categories::delete_category(&mut conn, unused.id).unwrap();
    assert!(categories::list_categories(&conn)
        .unwrap()
        .iter()
        .all(|c| c.name != "Misc"));
}
