use crate::db::Repository;
use crate::domain::{ImportRecord, TransactionKind};
use crate::error::LedgerError;
use crate::orchestration::handlers::{self, HandlerOutcome};
use serde::Serialize;
use tracing::{error, info};

/// Totals across a processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub records: usize,
    pub lots_created: usize,
    pub transactions_created: usize,
    pub history_rows: usize,
}

impl ProcessSummary {
    fn absorb(&mut self, outcome: HandlerOutcome) {
        self.records += 1;
        self.lots_created += outcome.lots_created;
        self.transactions_created += outcome.transactions_created;
        self.history_rows += outcome.history_rows;
    }
}

/// Dispatcher feeding normalized records to the per-kind handlers.
pub struct LedgerProcessor;

impl LedgerProcessor {
    /// Process records in the order supplied.
    ///
    /// Callers guarantee settlement-date ordering (see
    /// [`crate::domain::sort_records_for_processing`]). The first failing
    /// record stops the batch; its writes are rolled back while earlier
    /// records stay committed.
    ///
    /// # Errors
    /// Returns the failing record's error.
    pub async fn process_transactions(
        repo: &Repository,
        records: &[ImportRecord],
    ) -> Result<ProcessSummary, LedgerError> {
        let mut summary = ProcessSummary::default();

        for record in records {
            let transaction = &record.transaction;
            match Self::process_record(repo, record).await {
                Ok(outcome) => {
                    info!(
                        kind = %transaction.kind,
                        reference = transaction.reference.as_deref().unwrap_or("-"),
                        settlement_date = %transaction.settlement_date,
                        security = %record.security_key(),
                        transactions = outcome.transactions_created,
                        "Processed record"
                    );
                    summary.absorb(outcome);
                }
                Err(err) => {
                    error!(
                        kind = %transaction.kind,
                        reference = transaction.reference.as_deref().unwrap_or("-"),
                        settlement_date = %transaction.settlement_date,
                        security = %record.security_key(),
                        error = %err,
                        "Failed to process record, halting batch"
                    );
                    return Err(err);
                }
            }
        }

        Ok(summary)
    }

    /// Route one record to the handler for its kind.
    ///
    /// # Errors
    /// Returns the handler's error; nothing from this record is persisted then.
    pub async fn process_record(
        repo: &Repository,
        record: &ImportRecord,
    ) -> Result<HandlerOutcome, LedgerError> {
        match record.kind() {
            TransactionKind::Purchase | TransactionKind::TransferIn => {
                handlers::handle_inflow(repo, record).await
            }
            TransactionKind::SplitIn => handlers::handle_split_in(repo, record).await,
            TransactionKind::Sale | TransactionKind::TransferOut => {
                handlers::handle_outflow(repo, record).await
            }
            TransactionKind::SplitOut => handlers::handle_split_out(repo, record).await,
            TransactionKind::Dividend | TransactionKind::QualifiedDividend => {
                handlers::handle_cash(repo, record).await
            }
        }
    }
}
