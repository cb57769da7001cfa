//! Stable record ordering for deterministic processing.

use crate::domain::ImportRecord;
use chrono::NaiveDate;

/// Stable ordering key for import records.
///
/// Ordering: settlement date, then inflow kinds before everything else so
/// that basis exists before a same-day outflow consumes it. Records with
/// equal keys keep their source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordOrderingKey {
    /// Settlement date (primary sort).
    pub settlement_date: NaiveDate,
    /// 0 for inflows, 1 otherwise.
    pub flow_rank: u8,
}

impl RecordOrderingKey {
    pub fn from_record(record: &ImportRecord) -> Self {
        RecordOrderingKey {
            settlement_date: record.transaction.settlement_date,
            flow_rank: if record.kind().is_inflow() { 0 } else { 1 },
        }
    }

    /// Returns true if record_a should be processed before record_b.
    pub fn should_come_before(record_a: &ImportRecord, record_b: &ImportRecord) -> bool {
        Self::from_record(record_a) < Self::from_record(record_b)
    }
}

/// Sort records into processing order.
pub fn sort_records_for_processing(records: &mut [ImportRecord]) {
    records.sort_by_key(RecordOrderingKey::from_record);
}
