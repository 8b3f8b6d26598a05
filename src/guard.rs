// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Invariant guard: pre-checks run against balances read inside the same
//! unit of work as the write they protect.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Goal, Transaction, TxKind};
use crate::utils::money;
use rust_decimal::Decimal;

pub fn check_amount(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

fn require_covered(amount: Decimal, available: Decimal) -> LedgerResult<()> {
    if amount > available {
        return Err(LedgerError::InsufficientBalance {
            available,
            requested: amount,
        });
    }
    Ok(())
}

pub fn check_create(kind: TxKind, amount: Decimal, available: Decimal) -> LedgerResult<()> {
    check_amount(amount)?;
    if kind == TxKind::Expense {
        require_covered(amount, available)?;
    }
    Ok(())
}

/// Balance as if `existing` had never been recorded.
pub fn reverted_balance(existing: &Transaction, available: Decimal) -> Decimal {
    match existing.kind {
        TxKind::Expense => money(available + existing.amount),
        TxKind::Income => money(available - existing.amount),
    }
}

pub fn check_update(
    existing: &Transaction,
    new_kind: TxKind,
    new_amount: Decimal,
    available: Decimal,
) -> LedgerResult<()> {
    check_amount(new_amount)?;
    let adjusted = reverted_balance(existing, available);
    match new_kind {
        TxKind::Expense => require_covered(new_amount, adjusted),
        TxKind::Income => {
            let projected = money(adjusted + new_amount);
            // A ledger already below zero (recurring entries bypass the
            // guard) may still be edited as long as it does not get worse.
            if projected < Decimal::ZERO && projected < available {
                return Err(LedgerError::WouldCauseNegativeBalance {
                    available,
                    amount: money(existing.amount - new_amount),
                });
            }
            Ok(())
        }
    }
}

pub fn check_delete(existing: &Transaction, available: Decimal) -> LedgerResult<()> {
    if existing.kind == TxKind::Income && available - existing.amount < Decimal::ZERO {
        return Err(LedgerError::WouldCauseNegativeBalance {
            available,
            amount: existing.amount,
        });
    }
    Ok(())
}

/// Checks that need no stored state; run before the accounts are looked up.
pub fn check_transfer_shape(from_account_id: i64, to_account_id: i64, amount: Decimal) -> LedgerResult<()> {
    if from_account_id == to_account_id {
        return Err(LedgerError::SameAccountTransfer);
    }
    check_amount(amount)
}

pub fn check_transfer_funds(amount: Decimal, from_balance: Decimal) -> LedgerResult<()> {
    require_covered(amount, from_balance)
}

pub fn check_contribution(goal: &Goal, amount: Decimal, available: Decimal) -> LedgerResult<()> {
    check_amount(amount)?;
    if goal.completed {
        return Err(LedgerError::CompletedGoal);
    }
    require_covered(amount, available)
}

/// Applies an accepted contribution to the denormalized goal totals.
/// Completion is one-way.
pub fn apply_contribution(goal: &mut Goal, amount: Decimal) {
    goal.current_amount = money(goal.current_amount + amount);
    if goal.current_amount >= goal.target_amount {
        goal.completed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tx(kind: TxKind, amount: &str) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        Transaction {
            id: 1,
            amount: d(amount),
            kind,
            description: None,
            date,
            category_id: 1,
            account_id: None,
            created_at: date.and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    fn goal(target: &str, current: &str) -> Goal {
        Goal {
            id: 1,
            name: "Bike".into(),
            target_amount: d(target),
            current_amount: d(current),
            deadline: None,
            completed: false,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn expense_beyond_balance_is_rejected() {
        let err = check_create(TxKind::Expense, d("10.00"), d("0.00")).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert!(check_create(TxKind::Expense, d("10.00"), d("10.00")).is_ok());
        assert!(check_create(TxKind::Income, d("10.00"), d("-5.00")).is_ok());
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for bad in ["0", "-1.00"] {
            let err = check_create(TxKind::Income, d(bad), d("100")).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)));
        }
    }

    #[test]
    fn update_reverts_existing_before_checking() {
        // 100 income, 40 expense => 60 available; raising the expense to 100 fits.
        let existing = tx(TxKind::Expense, "40.00");
        assert!(check_update(&existing, TxKind::Expense, d("100.00"), d("60.00")).is_ok());
        let err = check_update(&existing, TxKind::Expense, d("100.01"), d("60.00")).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn flipping_income_to_expense_counts_twice() {
        // Only income is 50 and nothing else: reverting leaves 0.
        let existing = tx(TxKind::Income, "50.00");
        let err = check_update(&existing, TxKind::Expense, d("1.00"), d("50.00")).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn shrinking_income_below_spent_is_rejected() {
        // 100 income, 90 spent => 10 available; income cannot drop to 50.
        let existing = tx(TxKind::Income, "100.00");
        let err = check_update(&existing, TxKind::Income, d("50.00"), d("10.00")).unwrap_err();
        assert!(matches!(err, LedgerError::WouldCauseNegativeBalance { .. }));
        assert!(check_update(&existing, TxKind::Income, d("90.00"), d("10.00")).is_ok());
    }

    #[test]
    fn deleting_income_checks_remaining_balance() {
        let income = tx(TxKind::Income, "30.00");
        let err = check_delete(&income, d("20.00")).unwrap_err();
        assert!(matches!(err, LedgerError::WouldCauseNegativeBalance { .. }));
        assert!(check_delete(&income, d("30.00")).is_ok());
        assert!(check_delete(&tx(TxKind::Expense, "500.00"), d("0.00")).is_ok());
    }

    #[test]
    fn transfer_checks_in_order() {
        assert_eq!(
            check_transfer_shape(3, 3, d("-1")).unwrap_err(),
            LedgerError::SameAccountTransfer
        );
        assert!(matches!(
            check_transfer_shape(3, 4, d("0")).unwrap_err(),
            LedgerError::InvalidAmount(_)
        ));
        // Shape does not look at the balance at all.
        assert!(check_transfer_shape(3, 4, d("1000000")).is_ok());
        assert!(matches!(
            check_transfer_funds(d("100.01"), d("100")).unwrap_err(),
            LedgerError::InsufficientBalance { .. }
        ));
        assert!(check_transfer_funds(d("100"), d("100")).is_ok());
    }

    #[test]
    fn contribution_completes_goal_once() {
        let mut g = goal("50.00", "0.00");
        check_contribution(&g, d("50.00"), d("60.00")).unwrap();
        apply_contribution(&mut g, d("50.00"));
        assert!(g.completed);
        assert_eq!(g.current_amount, d("50.00"));
        assert_eq!(
            check_contribution(&g, d("1.00"), d("10.00")).unwrap_err(),
            LedgerError::CompletedGoal
        );
    }

    #[test]
    fn partial_contribution_leaves_goal_open() {
        let mut g = goal("50.00", "10.00");
        apply_contribution(&mut g, d("39.99"));
        assert!(!g.completed);
        assert_eq!(g.current_amount.to_string(), "49.99");
    }
}
