//! Timestamp helpers and the clock seam used for soft-delete stamping.

use crate::core::error::StorageError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

/// Clock used by the persister when stamping `deleted_at`. Passed in
/// explicitly so tests can pin time; no cached process-wide time state.
pub type Clock = fn() -> DateTime<Utc>;

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Canonical textual column form for date-valued fields (RFC 3339, UTC).
pub fn to_column_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a date-valued column. Accepts RFC 3339 and the
/// `YYYY-MM-DD HH:MM:SS` form SQLite's `CURRENT_TIMESTAMP` produces.
pub fn from_column_text(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| StorageError::Validation(format!("unparseable timestamp '{raw}': {e}")))
}

/// Column value for an optional timestamp: text when set, SQL NULL otherwise.
pub fn datetime_to_value(ts: Option<DateTime<Utc>>) -> JsonValue {
    match ts {
        Some(ts) => JsonValue::String(to_column_text(&ts)),
        None => JsonValue::Null,
    }
}

pub fn datetime_from_value(raw: &JsonValue) -> Result<Option<DateTime<Utc>>, StorageError> {
    match raw {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => from_column_text(s).map(Some),
        other => Err(StorageError::InvalidFieldType(format!(
            "expected a textual timestamp, got {other}"
        ))),
    }
}
