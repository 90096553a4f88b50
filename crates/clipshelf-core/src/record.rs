//! Record type and helpers.
//!
//! A [`Record`] is a JSON object mapping field names to values. Once
//! persisted it always carries every internal key (`id`, `timestamp`),
//! every required key, and every optional key (supplied or defaulted).
//! Ownership of stored records stays with the backing store; the
//! pipeline receives copies, transforms them, and hands them back.

use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// A resource record: a JSON object of field name to value.
pub type Record = Map<String, Value>;

/// Name of the server-managed identifier field.
pub const ID_KEY: &str = "id";

/// Name of the server-managed creation-timestamp field.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Reads the numeric id of a record, if present and integral.
#[must_use]
pub fn record_id(record: &Record) -> Option<u64> {
    record.get(ID_KEY).and_then(Value::as_u64)
}

/// Returns the current wall-clock time as milliseconds since the Unix
/// epoch, for stamping `timestamp` on freshly created records.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
