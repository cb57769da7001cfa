//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for ledger reads and the
//! `LedgerUnit` unit of work for grouped writes. Methods are organized
//! across submodules by entity:
//! - `lots.rs` - Asset lot and lot history operations
//! - `transactions.rs` - Transaction operations

mod lots;
mod transactions;

use crate::domain::{Amount, AmountError, Currency, TransactionKind};
use sqlx::sqlite::{Sqlite, SqlitePool};
use std::str::FromStr;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a unit of work.
    ///
    /// All writes made through the unit become visible together on
    /// [`LedgerUnit::commit`]. Dropping the unit without committing rolls
    /// every write back.
    ///
    /// # Errors
    /// Returns an error if a connection cannot be acquired.
    pub async fn begin(&self) -> Result<LedgerUnit, sqlx::Error> {
        Ok(LedgerUnit {
            tx: self.pool.begin().await?,
        })
    }
}

/// Transactional scope over the ledger store.
pub struct LedgerUnit {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl LedgerUnit {
    /// Commit every write made through this unit.
    ///
    /// # Errors
    /// Returns an error if the commit fails; nothing is persisted then.
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    /// Discard every write made through this unit.
    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

// =========================================================================
// Column encoding
// =========================================================================

/// Scale-4 mantissa for an INTEGER column.
fn encode_amount(amount: Amount) -> Result<i64, AmountError> {
    amount.mantissa()
}

fn decode_currency(value: &str) -> Result<Currency, sqlx::Error> {
    Currency::from_str(value).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

fn decode_kind(code: i64) -> Result<TransactionKind, sqlx::Error> {
    TransactionKind::from_code(code)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown transaction kind code {}", code).into()))
}
