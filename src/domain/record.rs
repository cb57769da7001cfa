//! Normalized import records and the `{lot, transaction}` pairs derived from them.

use crate::domain::{Amount, AmountError, Currency, NewAssetLot, Transaction, TransactionKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the source reported the cost of the shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasisInput {
    /// Price or cost basis per share.
    PerShare(Amount),
    /// Aggregate cost of all shares in the record.
    Aggregate(Amount),
}

/// Broker-independent record built by an import collaborator.
///
/// `shares` may be signed; outflows are commonly reported negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub reference: Option<String>,
    pub kind: TransactionKind,
    pub settlement_date: NaiveDate,
    pub symbol: String,
    pub isin: Option<String>,
    pub shares: Amount,
    pub basis: BasisInput,
    pub fees: Amount,
    pub currency: Currency,
    /// Cash amount reported for dividends.
    pub cash_amount: Option<Amount>,
}

/// Validated input to the engine: the lot an inflow would create and the
/// transaction describing the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub lot: NewAssetLot,
    pub transaction: Transaction,
}

impl ImportRecord {
    /// Derive the `{lot, transaction}` pair.
    ///
    /// # Errors
    /// Returns `AmountError::DivisionByZero` when an aggregate basis is
    /// reported for zero shares, and `AmountError::Overflow` when the
    /// derived totals are out of range.
    pub fn from_normalized(record: NormalizedRecord) -> Result<Self, AmountError> {
        let shares = record.shares.abs();
        let price_per_share = match record.basis {
            BasisInput::PerShare(price) => price,
            BasisInput::Aggregate(total) => total.abs().checked_div(shares)?,
        };

        let mut transaction = Transaction::new(
            record.reference,
            record.kind,
            record.settlement_date,
            record.symbol.clone(),
            shares,
            price_per_share,
            record.fees,
            record.currency,
        )?;
        if record.kind.is_dividend() {
            if let Some(cash) = record.cash_amount {
                transaction = transaction.with_total_amount(cash);
            }
        }

        let lot = NewAssetLot {
            symbol: record.symbol,
            isin: record.isin.filter(|isin| !isin.trim().is_empty()),
            shares,
            cost_basis_per_share: price_per_share,
            cost_basis_currency: record.currency,
            created_date: record.settlement_date,
        };

        Ok(ImportRecord { lot, transaction })
    }

    pub fn kind(&self) -> TransactionKind {
        self.transaction.kind
    }

    pub fn security_key(&self) -> &str {
        self.lot.security_key()
    }
}
