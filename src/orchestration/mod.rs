//! Orchestration of ledger writes: the per-kind handlers and the dispatcher
//! that feeds them a batch of records.

pub mod handlers;
pub mod processor;

pub use handlers::HandlerOutcome;
pub use processor::{LedgerProcessor, ProcessSummary};
