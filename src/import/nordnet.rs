//! Nordnet transaction export (tab separated, Swedish number format).
//!
//! The export has 30 columns; only the ones below are read.

use super::{amount_or_zero, column, date, non_empty, ImportError};
use crate::domain::{BasisInput, Currency, Locale, NormalizedRecord, TransactionKind};
use csv::StringRecord;

const LOCALE: Locale = Locale::Se;
const DATE_FORMAT: &str = "%Y-%m-%d";

const COL_ID: usize = 0;
const COL_SETTLEMENT_DAY: usize = 3;
const COL_TRANSACTION_TYPE: usize = 5;
const COL_SECURITY: usize = 6;
const COL_ISIN: usize = 7;
const COL_QUANTITY: usize = 8;
const COL_PRICE: usize = 9;
const COL_TOTAL_FEE: usize = 11;
const COL_PURCHASE_VALUE: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NordnetRow<'r> {
    pub id: &'r str,
    pub settlement_day: &'r str,
    pub transaction_type: &'r str,
    pub security: &'r str,
    pub isin: &'r str,
    pub quantity: &'r str,
    pub price: &'r str,
    pub total_fee: &'r str,
    pub purchase_value: &'r str,
}

impl<'r> NordnetRow<'r> {
    pub fn from_record(row: &'r StringRecord) -> Result<Self, ImportError> {
        Ok(NordnetRow {
            id: column(row, COL_ID, "Id")?,
            settlement_day: column(row, COL_SETTLEMENT_DAY, "Likviddag")?,
            transaction_type: column(row, COL_TRANSACTION_TYPE, "Transaktionstyp")?,
            security: column(row, COL_SECURITY, "Värdepapper")?,
            isin: column(row, COL_ISIN, "ISIN")?,
            quantity: column(row, COL_QUANTITY, "Antal")?,
            price: column(row, COL_PRICE, "Kurs")?,
            total_fee: column(row, COL_TOTAL_FEE, "Total Avgift")?,
            purchase_value: column(row, COL_PURCHASE_VALUE, "Inköpsvärde")?,
        })
    }
}

pub fn kind_for_label(label: &str) -> Option<TransactionKind> {
    match label {
        "KÖPT" => Some(TransactionKind::Purchase),
        "SÅLT" => Some(TransactionKind::Sale),
        "BYTE INLÄGG VP" => Some(TransactionKind::TransferIn),
        "BYTE UTTAG VP" => Some(TransactionKind::TransferOut),
        "SPLIT INLÄGG VP" => Some(TransactionKind::SplitIn),
        "SPLIT UTTAG VP" => Some(TransactionKind::SplitOut),
        "UTDELNING" => Some(TransactionKind::Dividend),
        _ => None,
    }
}

pub fn normalize(row: &StringRecord) -> Result<NormalizedRecord, ImportError> {
    transform(&NordnetRow::from_record(row)?)
}

/// Map a row to a normalized record.
///
/// Dividends are reported as quantity times per-share payout, so they
/// carry no separate cash amount.
pub fn transform(row: &NordnetRow<'_>) -> Result<NormalizedRecord, ImportError> {
    let kind = kind_for_label(row.transaction_type)
        .ok_or_else(|| ImportError::UnhandledKind(row.transaction_type.to_string()))?;

    let shares = amount_or_zero(row.quantity, LOCALE, "Antal")?;
    let basis = match kind {
        TransactionKind::TransferIn | TransactionKind::SplitIn => {
            BasisInput::Aggregate(amount_or_zero(row.purchase_value, LOCALE, "Inköpsvärde")?)
        }
        _ => BasisInput::PerShare(amount_or_zero(row.price, LOCALE, "Kurs")?),
    };
    let fees = amount_or_zero(row.total_fee, LOCALE, "Total Avgift")?;
    let settlement_date = date(row.settlement_day, DATE_FORMAT)?;

    Ok(NormalizedRecord {
        reference: non_empty(row.id),
        kind,
        settlement_date,
        symbol: row.security.to_string(),
        isin: non_empty(row.isin),
        shares,
        basis,
        fees,
        currency: Currency::Sek,
        cash_amount: None,
    })
}
