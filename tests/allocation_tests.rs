// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::commands::allocation::{self, NewRule, RulePatch};
use fintrack::commands::{categories, goals};
use fintrack::db;
use fintrack::error::LedgerError;
use fintrack::ledger;
use fintrack::models::{TargetType, TxKind};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> (Connection, i64, i64) {
    let conn = db::open_in_memory().unwrap();
    let goal = goals::create_goal(&conn, "Emergency fund", Decimal::from(1000), None).unwrap();
    let cat = categories::create_category(&conn, "Investing", TxKind::Expense, None).unwrap();
    (conn, goal.id, cat.id)
}

fn rule(name: &str, percentage: i64, target_type: TargetType, target_id: i64, sort_order: i64) -> NewRule {
    NewRule {
        name: name.into(),
        percentage,
        target_type,
        target_id,
        sort_order,
    }
}

#[test]
fn plan_follows_rule_order_without_normalizing() {
    let (mut conn, goal, cat) = setup();
    allocation::create_rule(&conn, rule("invest", 70, TargetType::Category, cat, 2)).unwrap();
    allocation::create_rule(&conn, rule("save", 50, TargetType::Goal, goal, 1)).unwrap();
    let paused = allocation::create_rule(&conn, rule("fun", 10, TargetType::Category, cat, 0)).unwrap();
    allocation::update_rule(
        &mut conn,
        paused.id,
        RulePatch {
            is_active: Some(false),
            ..RulePatch::default()
        },
    )
    .unwrap();

    let plan = ledger::plan_allocation(&conn, Decimal::from(1000)).unwrap();
    let names: Vec<&str> = plan.iter().map(|a| a.rule_name.as_str()).collect();
    assert_eq!(names, vec!["save", "invest"]);
    assert_eq!(plan[0].target_name, "Emergency fund");
    assert_eq!(plan[0].amount.to_string(), "500.00");
    assert_eq!(plan[1].target_name, "Investing");
    let total: Decimal = plan.iter().map(|a| a.amount).sum();
    assert_eq!(total, Decimal::from(1200));
}

#[test]
fn planning_writes_nothing() {
    let (conn, goal, _) = setup();
    allocation::create_rule(&conn, rule("save", 20, TargetType::Goal, goal, 0)).unwrap();
    ledger::plan_allocation(&conn, Decimal::from(250)).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM goal_contributions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(ledger::available_balance(&conn).unwrap(), Decimal::ZERO);
}

#[test]
fn percentage_must_be_within_bounds() {
    let (mut conn, goal, _) = setup();
    assert_eq!(
        allocation::create_rule(&conn, rule("x", 101, TargetType::Goal, goal, 0)).unwrap_err(),
        LedgerError::InvalidPercentage(101)
    );
    assert_eq!(
        allocation::create_rule(&conn, rule("x", -1, TargetType::Goal, goal, 0)).unwrap_err(),
        LedgerError::InvalidPercentage(-1)
    );
    let zero = allocation::create_rule(&conn, rule("none", 0, TargetType::Goal, goal, 0)).unwrap();
    assert_eq!(
        allocation::update_rule(
            &mut conn,
            zero.id,
            RulePatch {
                percentage: Some(150),
                ..RulePatch::default()
            }
        )
        .unwrap_err(),
        LedgerError::InvalidPercentage(150)
    );
}

#[test]
fn target_must_resolve() {
    let (mut conn, goal, cat) = setup();
    let err = allocation::create_rule(&conn, rule("x", 10, TargetType::Goal, cat + 100, 0)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTarget { target_id, .. } if target_id == cat + 100));

    let r = allocation::create_rule(&conn, rule("x", 10, TargetType::Goal, goal, 0)).unwrap();
    // The goal id is not a category id here.
    let err = allocation::update_rule(
        &mut conn,
        r.id,
        RulePatch {
            target_type: Some(TargetType::Category),
            target_id: Some(cat + 50),
            ..RulePatch::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTarget { .. }));
}

#[test]
fn listing_shows_missing_targets() {
    let (mut conn, goal, _) = setup();
    allocation::create_rule(&conn, rule("save", 10, TargetType::Goal, goal, 0)).unwrap();
    goals::delete_goal(&mut conn, goal).unwrap();
    let rows = allocation::list_rules(&conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].target_name, None);
    let plan = ledger::plan_allocation(&conn, Decimal::from(100)).unwrap();
    assert_eq!(plan[0].target_name, "");
}
