// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Errors raised by the ledger engine.
//!
//! Every variant except [`Busy`], [`Corrupt`] and [`Storage`] is a rejection
//! of a proposed mutation detected before anything was written.
//!
//! [`Busy`]: LedgerError::Busy
//! [`Corrupt`]: LedgerError::Corrupt
//! [`Storage`]: LedgerError::Storage

use rust_decimal::Decimal;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Amount must be greater than 0, got {0}")]
    InvalidAmount(Decimal),
    #[error("Insufficient balance. Available: {available}, requested: {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },
    #[error("Removing {amount} would leave a negative balance (available: {available})")]
    WouldCauseNegativeBalance { available: Decimal, amount: Decimal },
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Cannot contribute to a completed goal")]
    CompletedGoal,
    #[error("Budget already exists for category {category_id} in {year}-{month:02}")]
    DuplicatePeriod {
        category_id: i64,
        month: u32,
        year: i32,
    },
    #[error("Cannot delete {entity} with existing {dependents}")]
    HasDependents {
        entity: &'static str,
        dependents: &'static str,
    },
    #[error("Cannot delete default account")]
    DefaultAccount,
    #[error("Percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(i64),
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidPeriod(u32),
    #[error("Target {target_type} with id {target_id} not found")]
    InvalidTarget {
        target_type: String,
        target_id: i64,
    },
    #[error("Ledger is locked by another writer, retry later")]
    Busy,
    #[error("Corrupt ledger value: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Storage(rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Whether the same call may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Self::Busy
            }
            rusqlite::Error::FromSqlConversionFailure(col, _, ref inner) => {
                Self::Corrupt(format!("column {}: {}", col, inner))
            }
            rusqlite::Error::InvalidColumnType(col, ref name, ty) => {
                Self::Corrupt(format!("column {} ({}) has type {}", col, name, ty))
            }
            other => Self::Storage(other),
        }
    }
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            (Self::Storage(_), _) | (_, Self::Storage(_)) => false,
            _ => self.to_string() == other.to_string(),
        }
    }
}
