// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::commands::transactions::{self, TransactionFilter};
use fintrack::commands::{accounts, categories};
use fintrack::models::{AccountType, TxKind};
use fintrack::{cli, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    categories::create_category(&conn, "Salary", TxKind::Income, None).unwrap();
    categories::create_category(&conn, "Food", TxKind::Expense, None).unwrap();
    accounts::create_account(&mut conn, "Main", AccountType::Checking).unwrap();
    conn
}

/// Runs `fintrack tx <args..>` against `conn`.
fn tx(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let argv = ["fintrack", "tx"].iter().chain(args.iter()).copied();
    let matches = cli::build_cli().try_get_matches_from(argv)?;
    match matches.subcommand() {
        Some(("tx", tx_m)) => transactions::handle(conn, tx_m),
        _ => panic!("no tx subcommand"),
    }
}

#[test]
fn add_resolves_names_and_defaults() {
    let mut conn = setup();
    tx(&mut conn, &["add", "--amount", "100", "--kind", "income", "--category", "Salary", "--account", "Main", "--date", "2025-01-01"]).unwrap();
    tx(&mut conn, &["add", "--amount", "12.5", "--kind", "EXPENSE", "--category", "2", "--date", "2025-01-02", "--description", " lunch "]).unwrap();

    let rows = transactions::query_rows(&conn, &TransactionFilter::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].amount.to_string(), "12.50");
    assert_eq!(rows[0].category, "Food");
    assert_eq!(rows[0].account, "");
    assert_eq!(rows[0].description, "lunch");
    assert_eq!(rows[1].account, "Main");
}

#[test]
fn rejected_expense_surfaces_as_error() {
    let mut conn = setup();
    let err = tx(&mut conn, &["add", "--amount", "5", "--kind", "expense", "--category", "Food"]).unwrap_err();
    assert!(err.to_string().contains("Insufficient balance"), "{}", err);
    let err = tx(&mut conn, &["add", "--amount", "5", "--kind", "refund", "--category", "Food"]).unwrap_err();
    assert!(err.to_string().contains("unknown TxKind"), "{}", err);
    let err = tx(&mut conn, &["add", "--amount", "5", "--kind", "income", "--category", "Gifts"]).unwrap_err();
    assert!(err.to_string().contains("Category 'Gifts' not found"), "{}", err);
}

#[test]
fn edit_and_rm_go_through_the_guard() {
    let mut conn = setup();
    tx(&mut conn, &["add", "--amount", "30", "--kind", "income", "--category", "Salary"]).unwrap();
    tx(&mut conn, &["add", "--amount", "10", "--kind", "expense", "--category", "Food"]).unwrap();

    let err = tx(&mut conn, &["rm", "--id", "1"]).unwrap_err();
    assert!(err.to_string().contains("negative balance"), "{}", err);

    tx(&mut conn, &["edit", "--id", "2", "--amount", "30"]).unwrap();
    let err = tx(&mut conn, &["edit", "--id", "2", "--amount", "30.01"]).unwrap_err();
    assert!(err.to_string().contains("Insufficient balance"), "{}", err);

    tx(&mut conn, &["rm", "--id", "2"]).unwrap();
    tx(&mut conn, &["rm", "--id", "1"]).unwrap();
    assert!(transactions::query_rows(&conn, &TransactionFilter::default()).unwrap().is_empty());
}

#[test]
fn list_filters_and_pages() {
    let mut conn = setup();
    tx(&mut conn, &["add", "--amount", "100", "--kind", "income", "--category", "Salary", "--date", "2025-01-01"]).unwrap();
    for day in 2..=5 {
        let date = format!("2025-01-0{}", day);
        tx(&mut conn, &["add", "--amount", "1", "--kind", "expense", "--category", "Food", "--date", &date]).unwrap();
    }

    let matches = cli::build_cli().get_matches_from(["fintrack", "tx", "list", "--limit", "2"]);
    let limit = matches
        .subcommand_matches("tx")
        .and_then(|m| m.subcommand_matches("list"))
        .and_then(|m| m.get_one::<usize>("limit"))
        .copied()
        .unwrap();

    let first = transactions::query_rows(&conn, &TransactionFilter { limit, ..TransactionFilter::default() }).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].date.to_string(), "2025-01-05");
    let next = transactions::query_rows(
        &conn,
        &TransactionFilter {
            limit,
            offset: 2,
            ..TransactionFilter::default()
        },
    )
    .unwrap();
    assert_eq!(next[0].date.to_string(), "2025-01-03");

    let expenses = transactions::query_rows(
        &conn,
        &TransactionFilter {
            kind: Some(TxKind::Expense),
            from: chrono::NaiveDate::from_ymd_opt(2025, 1, 3),
            to: chrono::NaiveDate::from_ymd_opt(2025, 1, 4),
            ..TransactionFilter::default()
        },
    )
    .unwrap();
    assert_eq!(expenses.len(), 2);
    assert!(expenses.iter().all(|r| r.kind == TxKind::Expense));

    let salary = transactions::query_rows(
        &conn,
        &TransactionFilter {
            category_id: Some(1),
            ..TransactionFilter::default()
        },
    )
    .unwrap();
    assert_eq!(salary.len(), 1);
}

#[test]
fn edit_no_account_clears_the_account() {
    let mut conn = setup();
    tx(&mut conn, &["add", "--amount", "40", "--kind", "income", "--category", "Salary", "--account", "Main"]).unwrap();
    tx(&mut conn, &["edit", "--id", "1", "--no-account"]).unwrap();

    let rows = transactions::query_rows(&conn, &TransactionFilter::default()).unwrap();
    assert_eq!(rows[0].account, "");
    let err = tx(&mut conn, &["edit", "--id", "1", "--account", "Main", "--no-account"]).unwrap_err();
    assert!(err.to_string().contains("cannot be used with"), "{}", err);
}
