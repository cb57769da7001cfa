use crate::domain::{Amount, AmountError, UnhandledKind};
use crate::engine::AllocationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Parse error: {0}")]
    Parse(#[from] AmountError),
    #[error("Unhandled transaction kind: {0}")]
    UnhandledKind(String),
    #[error("Allocation shortfall for {security}: requested {requested}, available {available}")]
    AllocationShortfall {
        security: String,
        requested: Amount,
        available: Amount,
    },
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl LedgerError {
    /// Parse and unhandled-kind errors only affect the record at hand; the
    /// rest halt the batch.
    pub fn is_record_local(&self) -> bool {
        matches!(self, LedgerError::Parse(_) | LedgerError::UnhandledKind(_))
    }
}

impl From<UnhandledKind> for LedgerError {
    fn from(err: UnhandledKind) -> Self {
        LedgerError::UnhandledKind(err.0)
    }
}

impl From<AllocationError> for LedgerError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::Shortfall {
                security,
                requested,
                available,
            } => LedgerError::AllocationShortfall {
                security,
                requested,
                available,
            },
            AllocationError::NegativeQuantity(amount) => {
                LedgerError::InvalidRecord(format!("negative outflow quantity {}", amount))
            }
        }
    }
}
