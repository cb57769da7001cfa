//! E*Trade transaction history CSV.

use super::{amount, amount_or_zero, column, date, ImportError};
use crate::domain::{BasisInput, Currency, Locale, NormalizedRecord, TransactionKind};
use csv::StringRecord;

const LOCALE: Locale = Locale::Us;
const DATE_FORMAT: &str = "%m/%d/%y";

/// One row of the export, by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETradeRow<'r> {
    pub transaction_date: &'r str,
    pub transaction_type: &'r str,
    pub symbol: &'r str,
    pub quantity: &'r str,
    pub amount: &'r str,
    pub price: &'r str,
    pub commission: &'r str,
}

impl<'r> ETradeRow<'r> {
    pub fn from_record(row: &'r StringRecord) -> Result<Self, ImportError> {
        Ok(ETradeRow {
            transaction_date: column(row, 0, "TransactionDate")?,
            transaction_type: column(row, 1, "TransactionType")?,
            symbol: column(row, 3, "Symbol")?,
            quantity: column(row, 4, "Quantity")?,
            amount: column(row, 5, "Amount")?,
            price: column(row, 6, "Price")?,
            commission: column(row, 7, "Commission")?,
        })
    }
}

pub fn kind_for_label(label: &str) -> Option<TransactionKind> {
    match label {
        "Bought" => Some(TransactionKind::Purchase),
        "Sold" => Some(TransactionKind::Sale),
        "SplitIn" => Some(TransactionKind::SplitIn),
        "SplitOut" => Some(TransactionKind::SplitOut),
        "TransferIn" => Some(TransactionKind::TransferIn),
        "TransferOut" => Some(TransactionKind::TransferOut),
        "Dividend" => Some(TransactionKind::Dividend),
        "Qualified Dividend" => Some(TransactionKind::QualifiedDividend),
        _ => None,
    }
}

pub fn normalize(row: &StringRecord) -> Result<NormalizedRecord, ImportError> {
    transform(&ETradeRow::from_record(row)?)
}

/// Map a row to a normalized record. The kind is resolved first so that
/// unhandled rows are reported as such regardless of their other fields.
pub fn transform(row: &ETradeRow<'_>) -> Result<NormalizedRecord, ImportError> {
    let kind = kind_for_label(row.transaction_type)
        .ok_or_else(|| ImportError::UnhandledKind(row.transaction_type.to_string()))?;

    let shares = amount_or_zero(row.quantity, LOCALE, "Quantity")?;
    let basis = match kind {
        TransactionKind::TransferIn | TransactionKind::SplitIn => {
            BasisInput::Aggregate(amount_or_zero(row.amount, LOCALE, "Amount")?)
        }
        _ => BasisInput::PerShare(amount_or_zero(row.price, LOCALE, "Price")?),
    };
    let fees = amount_or_zero(row.commission, LOCALE, "Commission")?;
    let settlement_date = date(row.transaction_date, DATE_FORMAT)?;
    let cash_amount = if kind.is_dividend() {
        Some(amount(row.amount, LOCALE, "Amount")?)
    } else {
        None
    };

    Ok(NormalizedRecord {
        reference: None,
        kind,
        settlement_date,
        symbol: row.symbol.to_string(),
        isin: None,
        shares,
        basis,
        fees,
        currency: Currency::Usd,
        cash_amount,
    })
}
