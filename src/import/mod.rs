//! Broker export readers producing normalized import records.
//!
//! Field mapping lives here, outside the engine. Blank numeric fields
//! default to zero at this boundary; the engine never defaults values.

pub mod etrade;
pub mod nordnet;

use crate::config::ImportSource;
use crate::domain::{
    sort_records_for_processing, Amount, AmountError, ImportRecord, Locale,
};
use chrono::NaiveDate;
use csv::StringRecord;
use encoding_rs::{Encoding, UTF_16LE, UTF_8};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("export is neither UTF-8 nor UTF-16LE")]
    Encoding,
    #[error("unhandled transaction type: {0}")]
    UnhandledKind(String),
    #[error("value conversion failed for {field}: {value:?}")]
    Value {
        field: &'static str,
        value: String,
        #[source]
        source: AmountError,
    },
    #[error("invalid settlement date: {value:?}")]
    Date { value: String },
    #[error("missing column: {0}")]
    MissingColumn(&'static str),
    #[error("invalid record: {0}")]
    Derivation(#[from] AmountError),
}

/// Read an export file and return its records in processing order.
///
/// Unhandled transaction types are skipped. Malformed records abort the
/// read unless `skip_invalid` is set.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded, or a record is
/// malformed and `skip_invalid` is false.
pub fn read_export(
    path: impl AsRef<Path>,
    source: ImportSource,
    skip_invalid: bool,
) -> Result<Vec<ImportRecord>, ImportError> {
    let bytes = std::fs::read(path.as_ref())?;
    let text = decode_text(&bytes)?;
    let records = parse_export(&text, source, skip_invalid)?;
    info!(
        path = %path.as_ref().display(),
        records = records.len(),
        "Read broker export"
    );
    Ok(records)
}

/// Parse export text (header row first) for `source`.
///
/// # Errors
/// See [`read_export`].
pub fn parse_export(
    text: &str,
    source: ImportSource,
    skip_invalid: bool,
) -> Result<Vec<ImportRecord>, ImportError> {
    let delimiter = match source {
        ImportSource::ETrade => b',',
        ImportSource::Nordnet => b'\t',
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let line = index + 2;
        let normalized = match source {
            ImportSource::ETrade => etrade::normalize(&row),
            ImportSource::Nordnet => nordnet::normalize(&row),
        };
        match normalized.and_then(|n| Ok(ImportRecord::from_normalized(n)?)) {
            Ok(record) => records.push(record),
            Err(ImportError::UnhandledKind(label)) => {
                debug!(line, kind = %label, "Skipping unhandled transaction type");
            }
            Err(err) if skip_invalid => {
                warn!(line, error = %err, "Skipping invalid record");
            }
            Err(err) => return Err(err),
        }
    }

    sort_records_for_processing(&mut records);
    Ok(records)
}

/// Decode export bytes, removing any byte order mark.
///
/// The encoding comes from the byte order mark when there is one. Without
/// one, text whose first code unit has a zero high byte is read as
/// UTF-16LE and anything else as UTF-8.
pub fn decode_text(bytes: &[u8]) -> Result<String, ImportError> {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None if matches!(bytes, [low, 0, ..] if *low != 0) => UTF_16LE,
        None => UTF_8,
    };
    let (text, malformed) = encoding.decode_with_bom_removal(bytes);
    if malformed {
        return Err(ImportError::Encoding);
    }
    debug!(encoding = encoding.name(), "Decoded export");
    Ok(text.into_owned())
}

fn column<'r>(
    row: &'r StringRecord,
    index: usize,
    name: &'static str,
) -> Result<&'r str, ImportError> {
    row.get(index)
        .map(str::trim)
        .ok_or(ImportError::MissingColumn(name))
}

/// Parse a numeric field, treating a blank field as zero.
fn amount_or_zero(value: &str, locale: Locale, field: &'static str) -> Result<Amount, ImportError> {
    if value.trim().is_empty() {
        return Ok(Amount::zero());
    }
    amount(value, locale, field)
}

fn amount(value: &str, locale: Locale, field: &'static str) -> Result<Amount, ImportError> {
    Amount::parse(value, locale).map_err(|source| ImportError::Value {
        field,
        value: value.to_string(),
        source,
    })
}

fn date(value: &str, format: &str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(value, format).map_err(|_| ImportError::Date {
        value: value.to_string(),
    })
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
