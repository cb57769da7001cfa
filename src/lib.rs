pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod import;
pub mod orchestration;

pub use config::{Config, ImportConfig, ImportSource};
pub use db::{init_db, LedgerUnit, Repository};
pub use domain::{
    Amount, AssetLot, BasisInput, Currency, ImportRecord, Locale, LotHistoryEntry, LotId,
    NewAssetLot, NormalizedRecord, Transaction, TransactionId, TransactionKind,
};
pub use error::LedgerError;
pub use import::{read_export, ImportError};
pub use orchestration::{LedgerProcessor, ProcessSummary};
