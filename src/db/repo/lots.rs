//! Asset lot and lot history operations for the repository.

use crate::domain::{Amount, AssetLot, LotHistoryEntry, LotId, NewAssetLot};
use crate::error::LedgerError;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_currency, encode_amount, LedgerUnit, Repository};

const LOT_COLUMNS: &str =
    "id, symbol, isin, shares, cost_basis_per_share, cost_basis_currency, created_date";

fn lot_from_row(row: &SqliteRow, id_column: &str) -> Result<AssetLot, sqlx::Error> {
    let currency: String = row.try_get("cost_basis_currency")?;
    Ok(AssetLot {
        id: LotId::new(row.try_get(id_column)?),
        symbol: row.try_get("symbol")?,
        isin: row.try_get("isin")?,
        shares: Amount::from_mantissa(row.try_get("shares")?),
        cost_basis_per_share: Amount::from_mantissa(row.try_get("cost_basis_per_share")?),
        cost_basis_currency: decode_currency(&currency)?,
        created_date: row.try_get("created_date")?,
    })
}

impl LedgerUnit {
    /// Open lots (quantity > 0) of a security, highest cost basis first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn open_lots(&mut self, security_key: &str) -> Result<Vec<AssetLot>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM asset_lots
            WHERE security_key = ? AND shares > 0
            ORDER BY cost_basis_per_share DESC, created_date ASC, id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(security_key)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(|row| lot_from_row(row, "id")).collect()
    }

    /// Open lots with the given symbol created strictly before `date`.
    ///
    /// Matches on symbol rather than security key so lots survive a split
    /// that reissues the security under a new ISIN.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn open_lots_by_symbol_before(
        &mut self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Vec<AssetLot>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM asset_lots
            WHERE symbol = ? AND shares > 0 AND created_date < ?
            ORDER BY cost_basis_per_share DESC, created_date ASC, id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(symbol)
            .bind(date)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(|row| lot_from_row(row, "id")).collect()
    }

    /// Insert a new lot, deriving its identity from the security key, the
    /// creation date, and the number of lots the security already has.
    ///
    /// # Errors
    /// Returns `LedgerError::Parse` if an amount does not fit its column, or
    /// `LedgerError::Persistence` if the insert fails.
    pub async fn create_lot(&mut self, lot: &NewAssetLot) -> Result<AssetLot, LedgerError> {
        let security_key = lot.security_key().to_string();
        let (sequence,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) + 1 FROM asset_lots WHERE security_key = ?")
                .bind(&security_key)
                .fetch_one(&mut *self.tx)
                .await?;
        let id = LotId::derive(&security_key, lot.created_date, sequence);

        sqlx::query(
            r#"
            INSERT INTO asset_lots (
                id, security_key, symbol, isin, shares,
                cost_basis_per_share, cost_basis_currency, created_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(&security_key)
        .bind(&lot.symbol)
        .bind(lot.isin.as_deref())
        .bind(encode_amount(lot.shares)?)
        .bind(encode_amount(lot.cost_basis_per_share)?)
        .bind(lot.cost_basis_currency.as_str())
        .bind(lot.created_date)
        .execute(&mut *self.tx)
        .await?;

        Ok(lot.clone().into_lot(id))
    }

    /// Lower a lot's quantity.
    ///
    /// # Errors
    /// Returns `LedgerError::Persistence(sqlx::Error::RowNotFound)` if the
    /// lot does not exist or the new quantity would exceed the current one.
    pub async fn update_lot_quantity(
        &mut self,
        lot_id: &LotId,
        shares: Amount,
    ) -> Result<(), LedgerError> {
        let shares = encode_amount(shares)?;
        let result = sqlx::query("UPDATE asset_lots SET shares = ? WHERE id = ? AND shares >= ?")
            .bind(shares)
            .bind(lot_id.as_str())
            .bind(shares)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    /// Append a write-once snapshot of `lot` as of `as_of_date`.
    ///
    /// # Errors
    /// Returns an error if an amount does not fit its column or the insert fails.
    pub async fn append_lot_history(
        &mut self,
        lot: &AssetLot,
        as_of_date: NaiveDate,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO asset_lot_history (
                lot_id, symbol, isin, shares, cost_basis_per_share,
                cost_basis_currency, created_date, as_of_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(lot.id.as_str())
        .bind(&lot.symbol)
        .bind(lot.isin.as_deref())
        .bind(encode_amount(lot.shares)?)
        .bind(encode_amount(lot.cost_basis_per_share)?)
        .bind(lot.cost_basis_currency.as_str())
        .bind(lot.created_date)
        .bind(as_of_date)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

impl Repository {
    /// Get an asset lot by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_asset_lot(&self, lot_id: &LotId) -> Result<Option<AssetLot>, sqlx::Error> {
        let sql = format!("SELECT {LOT_COLUMNS} FROM asset_lots WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(lot_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| lot_from_row(&row, "id")).transpose()
    }

    /// Query the lots of a security, highest cost basis first.
    ///
    /// With `open_only` closed lots are left out.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_lots(
        &self,
        security_key: &str,
        open_only: bool,
    ) -> Result<Vec<AssetLot>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM asset_lots
            WHERE security_key = ? AND shares > ?
            ORDER BY cost_basis_per_share DESC, created_date ASC, id ASC
            "#
        );
        let share_floor: i64 = if open_only { 0 } else { -1 };
        let rows = sqlx::query(&sql)
            .bind(security_key)
            .bind(share_floor)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| lot_from_row(row, "id")).collect()
    }

    /// Query the history snapshots of a lot in the order they were written.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_lot_history(
        &self,
        lot_id: &LotId,
    ) -> Result<Vec<LotHistoryEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT lot_id, symbol, isin, shares, cost_basis_per_share,
                   cost_basis_currency, created_date, as_of_date
            FROM asset_lot_history
            WHERE lot_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(lot_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LotHistoryEntry {
                    lot: lot_from_row(row, "lot_id")?,
                    as_of_date: row.try_get("as_of_date")?,
                })
            })
            .collect()
    }

    /// Total number of history snapshots in the ledger.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count_lot_history(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM asset_lot_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::{AmountError, Currency};
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn d(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn new_lot(isin: Option<&str>, shares: &str, basis: &str, day: u32) -> NewAssetLot {
        NewAssetLot {
            symbol: "VOLV B".to_string(),
            isin: isin.map(str::to_string),
            shares: d(shares),
            cost_basis_per_share: d(basis),
            cost_basis_currency: Currency::Sek,
            created_date: NaiveDate::from_ymd_opt(2021, 9, day).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_lot_derives_sequential_ids() {
        let (repo, _temp) = setup_test_db().await;
        let mut unit = repo.begin().await.unwrap();
        let first = unit
            .create_lot(&new_lot(Some("SE0000115446"), "10", "200", 1))
            .await
            .unwrap();
        let second = unit
            .create_lot(&new_lot(Some("SE0000115446"), "5", "210", 1))
            .await
            .unwrap();
        let by_symbol = unit.create_lot(&new_lot(None, "1", "1", 2)).await.unwrap();
        unit.commit().await.unwrap();

        assert_eq!(first.id.as_str(), "SE0000115446-20210901-000001");
        assert_eq!(second.id.as_str(), "SE0000115446-20210901-000002");
        assert_eq!(by_symbol.id.as_str(), "VOLV B-20210902-000001");

        let stored = repo.get_asset_lot(&first.id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_open_lots_order_by_numeric_basis() {
        let (repo, _temp) = setup_test_db().await;
        let mut unit = repo.begin().await.unwrap();
        // As text "9" would sort above "10"; stored as mantissas it must not.
        unit.create_lot(&new_lot(None, "1", "9", 3)).await.unwrap();
        unit.create_lot(&new_lot(None, "1", "10", 2)).await.unwrap();
        unit.create_lot(&new_lot(None, "1", "10", 1)).await.unwrap();

        let lots = unit.open_lots("VOLV B").await.unwrap();
        let order: Vec<(Amount, u32)> = lots
            .iter()
            .map(|lot| (lot.cost_basis_per_share, chrono::Datelike::day(&lot.created_date)))
            .collect();
        assert_eq!(order, vec![(d("10"), 1), (d("10"), 2), (d("9"), 3)]);

        let before = unit
            .open_lots_by_symbol_before("VOLV B", NaiveDate::from_ymd_opt(2021, 9, 3).unwrap())
            .await
            .unwrap();
        assert_eq!(before.len(), 2);
    }

    #[tokio::test]
    async fn test_lots_before_match_symbol_across_isins() {
        let (repo, _temp) = setup_test_db().await;
        let mut unit = repo.begin().await.unwrap();
        unit.create_lot(&new_lot(Some("SE0000115446"), "10", "200", 1))
            .await
            .unwrap();
        unit.create_lot(&new_lot(Some("SE0000115447"), "3", "150", 2))
            .await
            .unwrap();
        let mut other = new_lot(Some("SE0000108656"), "7", "90", 1);
        other.symbol = "ERIC B".to_string();
        unit.create_lot(&other).await.unwrap();

        let lots = unit
            .open_lots_by_symbol_before("VOLV B", NaiveDate::from_ymd_opt(2021, 9, 5).unwrap())
            .await
            .unwrap();
        let keys: Vec<&str> = lots.iter().map(AssetLot::security_key).collect();
        assert_eq!(keys, vec!["SE0000115446", "SE0000115447"]);
    }

    #[tokio::test]
    async fn test_oversized_amount_is_a_parse_error() {
        let (repo, _temp) = setup_test_db().await;
        let mut unit = repo.begin().await.unwrap();
        let err = unit
            .create_lot(&new_lot(None, "10000000000000000", "1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Parse(AmountError::Overflow)));
        assert!(err.is_record_local());
    }

    #[tokio::test]
    async fn test_dropped_unit_rolls_back() {
        let (repo, _temp) = setup_test_db().await;
        {
            let mut unit = repo.begin().await.unwrap();
            unit.create_lot(&new_lot(None, "1", "1", 1)).await.unwrap();
        }
        let mut unit = repo.begin().await.unwrap();
        unit.create_lot(&new_lot(None, "1", "1", 1)).await.unwrap();
        unit.rollback().await.unwrap();

        assert!(repo.query_lots("VOLV B", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_lot_quantity_never_increases() {
        let (repo, _temp) = setup_test_db().await;
        let mut unit = repo.begin().await.unwrap();
        let lot = unit.create_lot(&new_lot(None, "10", "1", 1)).await.unwrap();

        unit.update_lot_quantity(&lot.id, d("4")).await.unwrap();
        let err = unit.update_lot_quantity(&lot.id, d("5")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(sqlx::Error::RowNotFound)));
        let missing = unit
            .update_lot_quantity(&LotId::new("nope".to_string()), d("0"))
            .await
            .unwrap_err();
        assert!(matches!(missing, LedgerError::Persistence(sqlx::Error::RowNotFound)));

        unit.update_lot_quantity(&lot.id, Amount::zero()).await.unwrap();
        let mut closed = lot.clone();
        closed.shares = Amount::zero();
        unit.append_lot_history(&closed, NaiveDate::from_ymd_opt(2021, 10, 1).unwrap())
            .await
            .unwrap();
        unit.commit().await.unwrap();

        assert!(repo.query_lots("VOLV B", true).await.unwrap().is_empty());
        assert_eq!(repo.query_lots("VOLV B", false).await.unwrap().len(), 1);
        let history = repo.query_lot_history(&lot.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].lot, closed);
        assert_eq!(repo.count_lot_history().await.unwrap(), 1);
    }
}
