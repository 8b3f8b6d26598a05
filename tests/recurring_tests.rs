// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::commands::categories;
use fintrack::commands::recurring::{self, NewTemplate, TemplatePatch};
use fintrack::ledger;
use fintrack::models::{Interval, TxKind};
use fintrack::recurring::MAX_TRANSACTIONS_PER_RUN;
use fintrack::{db, store};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    categories::create_category(&conn, "Rent", TxKind::Expense, None).unwrap();
    conn
}

fn template(conn: &Connection, interval: Interval, next_date: NaiveDate) -> i64 {
    recurring::create_template(
        conn,
        NewTemplate {
            amount: Decimal::new(1200, 0),
            kind: TxKind::Expense,
            description: Some("rent".into()),
            category_id: 1,
            interval,
            next_date,
        },
    )
    .unwrap()
    .id
}

fn dates(conn: &Connection) -> Vec<NaiveDate> {
    let mut stmt = conn
        .prepare("SELECT date FROM transactions ORDER BY date, id")
        .unwrap();
    stmt.query_map([], |r| r.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn month_end_schedule_clamps_and_recovers() {
    let mut conn = setup();
    let id = template(&conn, Interval::Monthly, ymd(2024, 1, 31));

    let report = ledger::run_recurring_generation(&mut conn, ymd(2024, 3, 1)).unwrap();
    assert_eq!(report.created, 2);
    assert!(!report.limit_reached);
    assert_eq!(dates(&conn), vec![ymd(2024, 1, 31), ymd(2024, 2, 29)]);
    assert_eq!(store::get_recurring(&conn, id).unwrap().next_date, ymd(2024, 3, 31));
}

#[test]
fn second_run_for_same_day_creates_nothing() {
    let mut conn = setup();
    template(&conn, Interval::Weekly, ymd(2024, 1, 1));
    let first = ledger::run_recurring_generation(&mut conn, ymd(2024, 1, 29)).unwrap();
    assert_eq!(first.created, 5);
    let again = ledger::run_recurring_generation(&mut conn, ymd(2024, 1, 29)).unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.scanned, 0);
    assert_eq!(dates(&conn).len(), 5);
}

#[test]
fn generation_bypasses_the_balance_guard() {
    let mut conn = setup();
    template(&conn, Interval::Monthly, ymd(2024, 1, 1));
    ledger::run_recurring_generation(&mut conn, ymd(2024, 1, 1)).unwrap();
    assert_eq!(ledger::available_balance(&conn).unwrap(), Decimal::new(-1200, 0));
    let account: Option<i64> = conn
        .query_row("SELECT account_id FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(account, None);
}

#[test]
fn run_is_capped_and_resumes() {
    let mut conn = setup();
    let id = template(&conn, Interval::Daily, ymd(2024, 1, 1));
    let as_of = ymd(2024, 5, 29); // 150 daily firings

    let first = ledger::run_recurring_generation(&mut conn, as_of).unwrap();
    assert_eq!(first.created, MAX_TRANSACTIONS_PER_RUN);
    assert!(first.limit_reached);
    assert_eq!(store::get_recurring(&conn, id).unwrap().next_date, ymd(2024, 4, 10));

    let second = ledger::run_recurring_generation(&mut conn, as_of).unwrap();
    assert_eq!(second.created, 50);
    assert!(!second.limit_reached);

    let all = dates(&conn);
    assert_eq!(all.len(), 150);
    let mut unique = all.clone();
    unique.dedup();
    assert_eq!(unique.len(), 150);
    assert_eq!(all.last(), Some(&as_of));
}

#[test]
fn cap_spans_templates_in_date_order() {
    let mut conn = setup();
    let late = template(&conn, Interval::Daily, ymd(2024, 3, 1));
    let early = template(&conn, Interval::Daily, ymd(2024, 1, 1));
    let report = ledger::run_recurring_generation(&mut conn, ymd(2024, 4, 30)).unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.created, 100);
    assert!(report.limit_reached);
    // The earlier schedule is served first and exhausts the cap.
    assert_eq!(store::get_recurring(&conn, early).unwrap().next_date, ymd(2024, 4, 10));
    assert_eq!(store::get_recurring(&conn, late).unwrap().next_date, ymd(2024, 3, 1));
}

#[test]
fn paused_and_future_templates_are_skipped() {
    let mut conn = setup();
    let paused = template(&conn, Interval::Daily, ymd(2024, 1, 1));
    template(&conn, Interval::Yearly, ymd(2030, 1, 1));
    recurring::update_template(
        &mut conn,
        paused,
        TemplatePatch {
            is_active: Some(false),
            ..TemplatePatch::default()
        },
    )
    .unwrap();
    let report = ledger::run_recurring_generation(&mut conn, ymd(2024, 2, 1)).unwrap();
    assert_eq!(report.created, 0);
    assert!(dates(&conn).is_empty());
}

#[test]
fn new_next_date_moves_the_anchor() {
    let mut conn = setup();
    let id = template(&conn, Interval::Monthly, ymd(2024, 1, 31));
    let t = recurring::update_template(
        &mut conn,
        id,
        TemplatePatch {
            next_date: Some(ymd(2024, 2, 15)),
            ..TemplatePatch::default()
        },
    )
    .unwrap();
    assert_eq!(t.anchor_day, 15);
    ledger::run_recurring_generation(&mut conn, ymd(2024, 3, 20)).unwrap();
    assert_eq!(dates(&conn), vec![ymd(2024, 2, 15), ymd(2024, 3, 15)]);
}

#[test]
fn template_requires_positive_amount_and_known_category() {
    let conn = setup();
    let err = recurring::create_template(
        &conn,
        NewTemplate {
            amount: Decimal::ZERO,
            kind: TxKind::Income,
            description: None,
            category_id: 1,
            interval: Interval::Daily,
            next_date: ymd(2024, 1, 1),
        },
    )
    .unwrap_err();
    assert!(matches!(err, fintrack::error::LedgerError::InvalidAmount(_)));

    let err = recurring::create_template(
        &conn,
        NewTemplate {
            amount: Decimal::ONE,
            kind: TxKind::Income,
            description: None,
            category_id: 9,
            interval: Interval::Daily,
            next_date: ymd(2024, 1, 1),
        },
    )
    .unwrap_err();
    assert_eq!(err, fintrack::error::LedgerError::not_found("Category", 9));
}
