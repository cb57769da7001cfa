//! Domain types for the lot ledger.
//!
//! This module provides:
//! - Scale-4 fixed point `Amount` with locale-aware parsing
//! - Primitives: Currency, LotId, TransactionId
//! - AssetLot and Transaction entities with their derivation rules
//! - Normalized import records and their processing order

pub mod amount;
pub mod kind;
pub mod lot;
pub mod ordering;
pub mod primitives;
pub mod record;
pub mod transaction;

pub use amount::{Amount, AmountError, Locale};
pub use kind::{TransactionKind, UnhandledKind};
pub use lot::{AssetLot, LotHistoryEntry, NewAssetLot};
pub use ordering::{sort_records_for_processing, RecordOrderingKey};
pub use primitives::{Currency, CurrencyParseError, LotId, TransactionId};
pub use record::{BasisInput, ImportRecord, NormalizedRecord};
pub use transaction::Transaction;
