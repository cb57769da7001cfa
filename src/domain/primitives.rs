//! Domain primitives: Currency, LotId, TransactionId.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Currency of a cost basis or a transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Sek,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Sek => "SEK",
            Currency::Usd => "USD",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown currency: {0}")]
pub struct CurrencyParseError(pub String);

impl FromStr for Currency {
    type Err = CurrencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEK" => Ok(Currency::Sek),
            "USD" => Ok(Currency::Usd),
            other => Err(CurrencyParseError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of an asset lot.
///
/// Derived as `<security key>-<YYYYMMDD>-<sequence:06>`, where the sequence
/// counts lots already created for the same security key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LotId(pub String);

impl LotId {
    pub fn new(id: String) -> Self {
        LotId(id)
    }

    /// Derive the lot identity for the `sequence`-th lot of a security.
    pub fn derive(security_key: &str, created_date: NaiveDate, sequence: i64) -> Self {
        LotId(format!(
            "{}-{}-{:06}",
            security_key,
            created_date.format("%Y%m%d"),
            sequence
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned identity of a persisted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl TransactionId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key used to group lots of one security: the ISIN when known, else the symbol.
pub fn security_key<'a>(isin: Option<&'a str>, symbol: &'a str) -> &'a str {
    match isin {
        Some(isin) if !isin.trim().is_empty() => isin,
        _ => symbol,
    }
}
