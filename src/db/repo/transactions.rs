//! Transaction operations for the repository.

use crate::domain::{Amount, LotId, Transaction, TransactionId};
use crate::error::LedgerError;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_currency, decode_kind, encode_amount, LedgerUnit, Repository};

const TRANSACTION_COLUMNS: &str = r#"
    id, reference, kind, settlement_date, symbol, share_lot, shares,
    price_per_share, share_value, fees_amount, total_amount, currency
"#;

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    let currency: String = row.try_get("currency")?;
    let lot_id: Option<String> = row.try_get("share_lot")?;
    Ok(Transaction {
        id: Some(TransactionId(row.try_get("id")?)),
        reference: row.try_get("reference")?,
        kind: decode_kind(row.try_get("kind")?)?,
        settlement_date: row.try_get("settlement_date")?,
        symbol: row.try_get("symbol")?,
        lot_id: lot_id.map(LotId::new),
        shares: Amount::from_mantissa(row.try_get("shares")?),
        price_per_share: Amount::from_mantissa(row.try_get("price_per_share")?),
        share_value: Amount::from_mantissa(row.try_get("share_value")?),
        fees: Amount::from_mantissa(row.try_get("fees_amount")?),
        total_amount: Amount::from_mantissa(row.try_get("total_amount")?),
        currency: decode_currency(&currency)?,
    })
}

impl LedgerUnit {
    /// Insert a transaction and return its storage id.
    ///
    /// # Errors
    /// Returns `LedgerError::Parse` if an amount does not fit its column, or
    /// `LedgerError::Persistence` if the insert fails.
    pub async fn create_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<TransactionId, LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                reference, kind, settlement_date, symbol, share_lot, shares,
                price_per_share, share_value, fees_amount, total_amount, currency
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.reference.as_deref())
        .bind(transaction.kind.code())
        .bind(transaction.settlement_date)
        .bind(&transaction.symbol)
        .bind(transaction.lot_id.as_ref().map(LotId::as_str))
        .bind(encode_amount(transaction.shares)?)
        .bind(encode_amount(transaction.price_per_share)?)
        .bind(encode_amount(transaction.share_value)?)
        .bind(encode_amount(transaction.fees)?)
        .bind(encode_amount(transaction.total_amount)?)
        .bind(transaction.currency.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(TransactionId(result.last_insert_rowid()))
    }
}

impl Repository {
    /// Get a transaction by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    /// Query transactions settled within `[start, end]`, ordered by
    /// settlement date and then insertion order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE settlement_date BETWEEN ? AND ?
            ORDER BY settlement_date ASC, id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    /// Query every transaction that touched a lot.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_transactions_for_lot(
        &self,
        lot_id: &LotId,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE share_lot = ? ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(lot_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    /// Total number of transactions in the ledger.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count_transactions(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
