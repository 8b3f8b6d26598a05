// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring transaction generator.
//!
//! Each firing writes one transaction dated at the template's `next_date`
//! and then moves `next_date` one interval forward. Templates only fire
//! while `next_date <= as_of`, so a second run for the same day finds
//! nothing left to do.

use crate::error::LedgerResult;
use crate::models::{Interval, RecurringTemplate};
use crate::store::{recurring_from_row, RECURRING_COLS};
use chrono::{Datelike, Days, Months, NaiveDate};
use rusqlite::{params, Connection};
use serde::Serialize;

/// Upper bound on transactions materialized by one invocation.
pub const MAX_TRANSACTIONS_PER_RUN: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Due templates loaded for this run.
    pub scanned: usize,
    pub created: usize,
    pub limit_reached: bool,
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 28,
    }
}

/// Same month offset, landing on `anchor_day` or the last day of a shorter
/// month.
fn step_months(date: NaiveDate, months: u32, anchor_day: u32) -> Option<NaiveDate> {
    let first = date.with_day(1)?.checked_add_months(Months::new(months))?;
    let day = anchor_day.clamp(1, days_in_month(first.year(), first.month()));
    first.with_day(day)
}

/// Next firing date after `date`.
pub fn advance(date: NaiveDate, interval: Interval, anchor_day: u32) -> Option<NaiveDate> {
    match interval {
        Interval::Daily => date.checked_add_days(Days::new(1)),
        Interval::Weekly => date.checked_add_days(Days::new(7)),
        Interval::Monthly => step_months(date, 1, anchor_day),
        Interval::Yearly => step_months(date, 12, anchor_day),
    }
}

fn due_templates(conn: &Connection, as_of: NaiveDate) -> LedgerResult<Vec<RecurringTemplate>> {
    let sql = format!(
        "SELECT {} FROM recurring_transactions WHERE is_active=1 AND next_date<=?1 ORDER BY next_date, id",
        RECURRING_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![as_of], recurring_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Materializes every due firing up to `as_of`, bounded by `cap`.
///
/// Must run inside a unit of work: transaction inserts and `next_date`
/// updates commit together. No balance check applies here.
pub fn generate(conn: &Connection, as_of: NaiveDate, cap: usize) -> LedgerResult<GenerationReport> {
    let templates = due_templates(conn, as_of)?;
    let mut report = GenerationReport {
        scanned: templates.len(),
        ..GenerationReport::default()
    };

    let mut insert = conn.prepare_cached(
        "INSERT INTO transactions(amount, kind, description, date, category_id, account_id)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
    )?;
    let mut bump =
        conn.prepare_cached("UPDATE recurring_transactions SET next_date=?1 WHERE id=?2")?;

    for mut t in templates {
        let start = t.next_date;
        let mut exhausted = false;
        while t.next_date <= as_of {
            if report.created >= cap {
                report.limit_reached = true;
                break;
            }
            insert.execute(params![
                t.amount.to_string(),
                t.kind,
                t.description,
                t.next_date,
                t.category_id
            ])?;
            report.created += 1;
            match advance(t.next_date, t.interval, t.anchor_day) {
                Some(next) => t.next_date = next,
                None => {
                    tracing::warn!(template = t.id, date = %t.next_date, "schedule ran past the calendar");
                    exhausted = true;
                    break;
                }
            }
        }
        if t.next_date != start {
            bump.execute(params![t.next_date, t.id])?;
        }
        if exhausted {
            // next_date already fired; keep it from firing again.
            conn.execute(
                "UPDATE recurring_transactions SET is_active=0 WHERE id=?1",
                params![t.id],
            )?;
        }
        if report.limit_reached {
            break;
        }
    }

    tracing::info!(
        as_of = %as_of,
        scanned = report.scanned,
        created = report.created,
        limit_reached = report.limit_reached,
        "recurring generation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_clamps_and_recovers_anchor() {
        let feb = advance(ymd(2024, 1, 31), Interval::Monthly, 31).unwrap();
        assert_eq!(feb, ymd(2024, 2, 29));
        let mar = advance(feb, Interval::Monthly, 31).unwrap();
        assert_eq!(mar, ymd(2024, 3, 31));
        let apr = advance(mar, Interval::Monthly, 31).unwrap();
        assert_eq!(apr, ymd(2024, 4, 30));
    }

    #[test]
    fn non_leap_february() {
        assert_eq!(
            advance(ymd(2023, 1, 30), Interval::Monthly, 30).unwrap(),
            ymd(2023, 2, 28)
        );
    }

    #[test]
    fn december_rolls_into_next_year() {
        assert_eq!(
            advance(ymd(2024, 12, 15), Interval::Monthly, 15).unwrap(),
            ymd(2025, 1, 15)
        );
    }

    #[test]
    fn yearly_leap_day() {
        let next = advance(ymd(2024, 2, 29), Interval::Yearly, 29).unwrap();
        assert_eq!(next, ymd(2025, 2, 28));
        let leap_again = (0..3).fold(next, |d, _| advance(d, Interval::Yearly, 29).unwrap());
        assert_eq!(leap_again, ymd(2028, 2, 29));
    }

    #[test]
    fn daily_and_weekly_steps() {
        assert_eq!(
            advance(ymd(2024, 2, 28), Interval::Daily, 28).unwrap(),
            ymd(2024, 2, 29)
        );
        assert_eq!(
            advance(ymd(2024, 12, 28), Interval::Weekly, 28).unwrap(),
            ymd(2025, 1, 4)
        );
    }
}
