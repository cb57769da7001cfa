//! Transaction records: immutable ledger events.

use crate::domain::{Amount, AmountError, Currency, LotId, TransactionId, TransactionKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single ledger event.
///
/// `share_value` is always `round4(price_per_share * shares)` and
/// `total_amount` is `share_value - fees`, except for inventory movements
/// (transfers and splits) where both are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Storage identity, `None` until persisted.
    pub id: Option<TransactionId>,
    /// Source system's transaction id, if the broker provides one.
    pub reference: Option<String>,
    pub kind: TransactionKind,
    pub settlement_date: NaiveDate,
    pub symbol: String,
    /// Lot the event touched; `None` for cash events and unassigned inflows.
    pub lot_id: Option<LotId>,
    pub shares: Amount,
    pub price_per_share: Amount,
    pub share_value: Amount,
    pub fees: Amount,
    pub total_amount: Amount,
    pub currency: Currency,
}

impl Transaction {
    /// Build a transaction, deriving share value and net total.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when the derived totals are out of range.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reference: Option<String>,
        kind: TransactionKind,
        settlement_date: NaiveDate,
        symbol: String,
        shares: Amount,
        price_per_share: Amount,
        fees: Amount,
        currency: Currency,
    ) -> Result<Self, AmountError> {
        let (share_value, total_amount) = Self::derive_totals(kind, price_per_share, shares, fees)?;
        Ok(Transaction {
            id: None,
            reference,
            kind,
            settlement_date,
            symbol,
            lot_id: None,
            shares,
            price_per_share,
            share_value,
            fees,
            total_amount,
            currency,
        })
    }

    fn derive_totals(
        kind: TransactionKind,
        price_per_share: Amount,
        shares: Amount,
        fees: Amount,
    ) -> Result<(Amount, Amount), AmountError> {
        if kind.is_inventory_movement() {
            return Ok((Amount::zero(), Amount::zero()));
        }
        let share_value = price_per_share.checked_mul(shares)?;
        Ok((share_value, share_value.checked_sub(fees)?))
    }

    /// Derive the per-lot transaction for `shares` drawn from `lot_id`.
    ///
    /// The derived transaction carries no fee; see [`Transaction::with_fees`].
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when the derived totals are out of range.
    pub fn for_lot(&self, lot_id: LotId, shares: Amount) -> Result<Transaction, AmountError> {
        let (share_value, total_amount) =
            Self::derive_totals(self.kind, self.price_per_share, shares, Amount::zero())?;
        Ok(Transaction {
            id: None,
            reference: self.reference.clone(),
            kind: self.kind,
            settlement_date: self.settlement_date,
            symbol: self.symbol.clone(),
            lot_id: Some(lot_id),
            shares,
            price_per_share: self.price_per_share,
            share_value,
            fees: Amount::zero(),
            total_amount,
            currency: self.currency,
        })
    }

    /// Attach `fees`, lowering the net total accordingly.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when the net total is out of range.
    pub fn with_fees(mut self, fees: Amount) -> Result<Transaction, AmountError> {
        self.fees = fees;
        if !self.kind.is_inventory_movement() {
            self.total_amount = self.share_value.checked_sub(fees)?;
        }
        Ok(self)
    }

    /// Override the net total; used for dividends reported as a cash amount.
    pub fn with_total_amount(mut self, total_amount: Amount) -> Transaction {
        self.total_amount = total_amount;
        self
    }

    pub fn with_lot(mut self, lot_id: LotId) -> Transaction {
        self.lot_id = Some(lot_id);
        self
    }
}
