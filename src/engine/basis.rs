//! Cost basis recomputation for lots created from an aggregate cost.

use crate::domain::{Amount, AmountError, AssetLot};

/// Sum of `round4(cost_basis_per_share * shares)` over `lots`.
///
/// # Errors
/// Returns `AmountError::Overflow` when a product or the sum is out of range.
pub fn aggregate_cost_basis(lots: &[AssetLot]) -> Result<Amount, AmountError> {
    lots.iter().try_fold(Amount::zero(), |total, lot| {
        total.checked_add(lot.total_cost_basis()?)
    })
}

/// Per-share basis for `shares` new shares carrying `total_basis`.
///
/// # Errors
/// Returns `AmountError::DivisionByZero` when `shares` is zero.
pub fn per_share_basis(total_basis: Amount, shares: Amount) -> Result<Amount, AmountError> {
    total_basis.checked_div(shares)
}
