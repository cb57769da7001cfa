//! Asset lots: dated, cost-tagged quantities of one security.

use crate::domain::primitives::security_key;
use crate::domain::{Amount, AmountError, Currency, LotId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A persisted lot. Its quantity only ever decreases; a lot at zero is
/// closed but kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLot {
    pub id: LotId,
    pub symbol: String,
    pub isin: Option<String>,
    pub shares: Amount,
    pub cost_basis_per_share: Amount,
    pub cost_basis_currency: Currency,
    /// Settlement date of the event that created the lot.
    pub created_date: NaiveDate,
}

impl AssetLot {
    pub fn security_key(&self) -> &str {
        security_key(self.isin.as_deref(), &self.symbol)
    }

    pub fn is_closed(&self) -> bool {
        self.shares.is_zero()
    }

    /// Cost basis of the whole remaining quantity, quantized to scale 4.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when the product is out of range.
    pub fn total_cost_basis(&self) -> Result<Amount, AmountError> {
        self.cost_basis_per_share.checked_mul(self.shares)
    }
}

/// A lot that has not been written yet; storage assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssetLot {
    pub symbol: String,
    pub isin: Option<String>,
    pub shares: Amount,
    pub cost_basis_per_share: Amount,
    pub cost_basis_currency: Currency,
    pub created_date: NaiveDate,
}

impl NewAssetLot {
    pub fn security_key(&self) -> &str {
        security_key(self.isin.as_deref(), &self.symbol)
    }

    pub fn into_lot(self, id: LotId) -> AssetLot {
        AssetLot {
            id,
            symbol: self.symbol,
            isin: self.isin,
            shares: self.shares,
            cost_basis_per_share: self.cost_basis_per_share,
            cost_basis_currency: self.cost_basis_currency,
            created_date: self.created_date,
        }
    }
}

/// Write-once snapshot of a lot as of a mutating transaction's settlement date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotHistoryEntry {
    pub lot: AssetLot,
    pub as_of_date: NaiveDate,
}
