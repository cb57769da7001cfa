//! Closed enumeration of ledger transaction kinds.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Sale,
    TransferIn,
    TransferOut,
    SplitIn,
    SplitOut,
    Dividend,
    QualifiedDividend,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unhandled transaction kind: {0}")]
pub struct UnhandledKind(pub String);

impl TransactionKind {
    pub const ALL: [TransactionKind; 8] = [
        TransactionKind::Purchase,
        TransactionKind::Sale,
        TransactionKind::TransferIn,
        TransactionKind::TransferOut,
        TransactionKind::SplitIn,
        TransactionKind::SplitOut,
        TransactionKind::Dividend,
        TransactionKind::QualifiedDividend,
    ];

    /// Stable storage code.
    pub fn code(&self) -> i64 {
        match self {
            TransactionKind::Purchase => 0,
            TransactionKind::Sale => 1,
            TransactionKind::TransferIn => 2,
            TransactionKind::TransferOut => 3,
            TransactionKind::SplitIn => 4,
            TransactionKind::SplitOut => 5,
            TransactionKind::Dividend => 6,
            TransactionKind::QualifiedDividend => 7,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "PURCHASE_TRANSACTION",
            TransactionKind::Sale => "SALE_TRANSACTION",
            TransactionKind::TransferIn => "TRANSFERIN_TRANSACTION",
            TransactionKind::TransferOut => "TRANSFEROUT_TRANSACTION",
            TransactionKind::SplitIn => "SPLITIN_TRANSACTION",
            TransactionKind::SplitOut => "SPLITOUT_TRANSACTION",
            TransactionKind::Dividend => "DIVIDEND",
            TransactionKind::QualifiedDividend => "QUALIFIED_DIVIDEND",
        }
    }

    /// Purchase, TransferIn, SplitIn: events that create a lot.
    pub fn is_inflow(&self) -> bool {
        matches!(
            self,
            TransactionKind::Purchase | TransactionKind::TransferIn | TransactionKind::SplitIn
        )
    }

    /// Sale, TransferOut, SplitOut: events that reduce lot quantities.
    pub fn is_outflow(&self) -> bool {
        matches!(
            self,
            TransactionKind::Sale | TransactionKind::TransferOut | TransactionKind::SplitOut
        )
    }

    /// Kinds that move basis rather than cash; their share value and total are zero.
    pub fn is_inventory_movement(&self) -> bool {
        matches!(
            self,
            TransactionKind::TransferIn
                | TransactionKind::TransferOut
                | TransactionKind::SplitIn
                | TransactionKind::SplitOut
        )
    }

    pub fn is_dividend(&self) -> bool {
        matches!(
            self,
            TransactionKind::Dividend | TransactionKind::QualifiedDividend
        )
    }
}

impl FromStr for TransactionKind {
    type Err = UnhandledKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| UnhandledKind(s.to_string()))
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
