// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Allocation planner: splits a base amount by independent percentage
//! rules. Outputs are not normalized and may sum to more or less than the
//! base.

use crate::error::LedgerResult;
use crate::models::{AllocationRule, TargetType};
use crate::store::{rule_from_row, RULE_COLS};
use crate::utils::money;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub rule_id: i64,
    pub rule_name: String,
    pub percentage: u32,
    pub target_type: TargetType,
    pub target_id: i64,
    pub target_name: String,
    pub amount: Decimal,
}

pub fn split(base: Decimal, percentage: u32) -> Decimal {
    money(base * Decimal::from(percentage) / Decimal::ONE_HUNDRED)
}

/// Plans `base` over the active rules in `(sort_order, id)` order.
pub fn plan<F>(base: Decimal, rules: &[AllocationRule], mut target_name: F) -> Vec<Allocation>
where
    F: FnMut(TargetType, i64) -> String,
{
    let mut active: Vec<&AllocationRule> = rules.iter().filter(|r| r.is_active).collect();
    active.sort_by_key(|r| (r.sort_order, r.id));
    active
        .into_iter()
        .map(|r| Allocation {
            rule_id: r.id,
            rule_name: r.name.clone(),
            percentage: r.percentage,
            target_type: r.target_type,
            target_id: r.target_id,
            target_name: target_name(r.target_type, r.target_id),
            amount: split(base, r.percentage),
        })
        .collect()
}

pub fn active_rules(conn: &Connection) -> LedgerResult<Vec<AllocationRule>> {
    let sql = format!(
        "SELECT {} FROM allocation_rules WHERE is_active=1 ORDER BY sort_order, id",
        RULE_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], rule_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Name of a goal or category, `None` when the id does not resolve.
pub fn target_name(
    conn: &Connection,
    target_type: TargetType,
    target_id: i64,
) -> LedgerResult<Option<String>> {
    let sql = match target_type {
        TargetType::Goal => "SELECT name FROM goals WHERE id=?1",
        TargetType::Category => "SELECT name FROM categories WHERE id=?1",
    };
    Ok(conn
        .query_row(sql, params![target_id], |r| r.get(0))
        .optional()?)
}
