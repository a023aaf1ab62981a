//! Turns a stored record into JSON:API `attributes`.

use crate::store::Record;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Key under which providers expose the record identifier.
pub const OBJECT_ID: &str = "objectId";

/// Timestamp keys rendered as ISO-8601.
pub const TIMESTAMP_KEYS: [&str; 3] = ["createdAt", "updatedAt", "deletedAt"];

/// Drop `objectId` and render the reserved timestamps as ISO-8601 strings.
/// Epoch milliseconds and already-formatted strings both normalize to the same
/// output, so applying this twice is the same as applying it once. Values that
/// are not a valid instant are left as they are.
pub fn prepare_attributes(record: &Record) -> Record {
    let mut out = record.clone();
    out.remove(OBJECT_ID);
    for key in TIMESTAMP_KEYS {
        if let Some(v) = out.get_mut(key) {
            if let Some(iso) = to_iso(v) {
                *v = Value::String(iso);
            }
        }
    }
    out
}

/// Epoch milliseconds as an ISO-8601 string with millisecond precision.
pub fn iso_from_millis(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn to_iso(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(iso_from_millis),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    }
}
