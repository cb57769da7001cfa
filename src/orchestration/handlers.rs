//! One handler per transaction kind.
//!
//! Every handler runs inside its own `LedgerUnit`: either all lot
//! mutations, history snapshots, and transactions of a record are
//! committed, or none are. Any early return drops the unit, which rolls
//! it back.

use crate::db::{LedgerUnit, Repository};
use crate::domain::{ImportRecord, NewAssetLot};
use crate::engine::{aggregate_cost_basis, per_share_basis, Allocation, Allocator};
use crate::error::LedgerError;
use serde::Serialize;
use tracing::debug;

/// Rows written while handling one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HandlerOutcome {
    pub lots_created: usize,
    pub transactions_created: usize,
    pub history_rows: usize,
}

/// Purchase and TransferIn: create the lot at the record's basis and one
/// transaction referencing it.
pub async fn handle_inflow(
    repo: &Repository,
    record: &ImportRecord,
) -> Result<HandlerOutcome, LedgerError> {
    let mut unit = repo.begin().await?;
    let outcome = create_lot_with_transaction(&mut unit, record, record.lot.clone()).await?;
    unit.commit().await?;
    Ok(outcome)
}

/// SplitIn: the new lot inherits the aggregate basis of the lots with the
/// same symbol that were open before the settlement date. The split may
/// reissue the security under a new ISIN, so lots are matched by symbol.
pub async fn handle_split_in(
    repo: &Repository,
    record: &ImportRecord,
) -> Result<HandlerOutcome, LedgerError> {
    let mut unit = repo.begin().await?;
    let prior_lots = unit
        .open_lots_by_symbol_before(&record.lot.symbol, record.transaction.settlement_date)
        .await?;
    let total_basis = aggregate_cost_basis(&prior_lots)?;
    let cost_basis_per_share = per_share_basis(total_basis, record.lot.shares)?;
    debug!(
        security = %record.security_key(),
        prior_lots = prior_lots.len(),
        total_basis = %total_basis,
        cost_basis_per_share = %cost_basis_per_share,
        "Recomputed split basis"
    );

    let lot = NewAssetLot {
        cost_basis_per_share,
        ..record.lot.clone()
    };
    let outcome = create_lot_with_transaction(&mut unit, record, lot).await?;
    unit.commit().await?;
    Ok(outcome)
}

/// Sale and TransferOut: allocate the requested shares across open lots.
///
/// The allocation is planned before anything is written, so a shortfall
/// leaves the ledger untouched. A fee on an outflow of zero shares has no
/// lot transaction to land on and is rejected.
pub async fn handle_outflow(
    repo: &Repository,
    record: &ImportRecord,
) -> Result<HandlerOutcome, LedgerError> {
    let transaction = &record.transaction;
    if transaction.shares.is_zero() && !transaction.fees.is_zero() {
        return Err(LedgerError::InvalidRecord(format!(
            "{} of zero shares of {} carries a fee of {}",
            transaction.kind,
            record.security_key(),
            transaction.fees
        )));
    }

    let mut unit = repo.begin().await?;
    let lots = unit.open_lots(record.security_key()).await?;
    let allocations =
        Allocator::allocate(record.security_key(), &lots, record.transaction.shares)?;
    let outcome = write_allocations(&mut unit, record, &allocations).await?;
    unit.commit().await?;
    Ok(outcome)
}

/// SplitOut: every lot with the record's symbol open before the settlement
/// date is consumed whole. A symbol without open lots is a no-op.
pub async fn handle_split_out(
    repo: &Repository,
    record: &ImportRecord,
) -> Result<HandlerOutcome, LedgerError> {
    let mut unit = repo.begin().await?;
    let lots = unit
        .open_lots_by_symbol_before(&record.lot.symbol, record.transaction.settlement_date)
        .await?;
    let allocations = Allocator::drain(&lots);
    let outcome = write_allocations(&mut unit, record, &allocations).await?;
    unit.commit().await?;
    Ok(outcome)
}

/// Dividend and QualifiedDividend: a cash event against no lot.
pub async fn handle_cash(
    repo: &Repository,
    record: &ImportRecord,
) -> Result<HandlerOutcome, LedgerError> {
    let mut unit = repo.begin().await?;
    unit.create_transaction(&record.transaction).await?;
    unit.commit().await?;
    Ok(HandlerOutcome {
        transactions_created: 1,
        ..HandlerOutcome::default()
    })
}

async fn create_lot_with_transaction(
    unit: &mut LedgerUnit,
    record: &ImportRecord,
    lot: NewAssetLot,
) -> Result<HandlerOutcome, LedgerError> {
    let mut transaction = record.transaction.clone();
    transaction.price_per_share = lot.cost_basis_per_share;

    let lot = unit.create_lot(&lot).await?;
    debug!(lot_id = %lot.id, shares = %lot.shares, "Created lot");
    unit.create_transaction(&transaction.with_lot(lot.id)).await?;

    Ok(HandlerOutcome {
        lots_created: 1,
        transactions_created: 1,
        history_rows: 0,
    })
}

async fn write_allocations(
    unit: &mut LedgerUnit,
    record: &ImportRecord,
    allocations: &[Allocation],
) -> Result<HandlerOutcome, LedgerError> {
    let transactions = Allocator::lot_transactions(&record.transaction, allocations)?;
    let as_of_date = record.transaction.settlement_date;

    for (allocation, transaction) in allocations.iter().zip(&transactions) {
        unit.update_lot_quantity(&allocation.lot.id, allocation.lot.shares)
            .await?;
        unit.append_lot_history(&allocation.lot, as_of_date).await?;
        unit.create_transaction(transaction).await?;
        debug!(
            lot_id = %allocation.lot.id,
            drawn = %allocation.drawn,
            remaining = %allocation.lot.shares,
            "Drew shares from lot"
        );
    }

    Ok(HandlerOutcome {
        lots_created: 0,
        transactions_created: transactions.len(),
        history_rows: allocations.len(),
    })
}
