use std::cmp::Ordering;
use std::fmt;

use chrono::DateTime;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::config::RecordFields;
use crate::error::BackendError;

/// Identifies exactly one log stream: one file on one host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId {
    pub host: String,
    pub file: String,
}

impl StreamId {
    pub fn new(host: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            file: file.into(),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.file)
    }
}

/// Composite ordering key of a record.
///
/// Field order matters: the derived `Ord` compares `timestamp` first and breaks
/// ties with `offset`, which is unique within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Event time in epoch milliseconds.
    pub timestamp: i64,
    /// Byte offset of the line within its file.
    pub offset: u64,
}

impl RecordKey {
    pub const fn new(timestamp: i64, offset: u64) -> Self {
        Self { timestamp, offset }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.timestamp, self.offset)
    }
}

/// One indexed log line. The field map is opaque to the engine apart from the
/// two key fields, which are parsed once on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    key: RecordKey,
    fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(key: RecordKey, fields: Map<String, Value>) -> Self {
        Self { key, fields }
    }

    /// Build a record from a backend source document, reading the key from the
    /// configured timestamp and offset fields.
    pub fn from_source(fields: Map<String, Value>, names: &RecordFields) -> Result<Self, BackendError> {
        let timestamp = fields
            .get(&names.timestamp)
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                BackendError::malformed_record(format!(
                    "missing or unparseable `{}`",
                    names.timestamp
                ))
            })?;
        let offset = fields
            .get(&names.offset)
            .and_then(parse_offset)
            .ok_or_else(|| {
                BackendError::malformed_record(format!("missing or unparseable `{}`", names.offset))
            })?;
        Ok(Self {
            key: RecordKey { timestamp, offset },
            fields,
        })
    }

    pub fn key(&self) -> RecordKey {
        self.key
    }

    pub fn timestamp(&self) -> i64 {
        self.key.timestamp
    }

    pub fn offset(&self) -> u64 {
        self.key.offset
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Accepts epoch milliseconds (number or numeric string) and RFC 3339 dates.
/// Zone-less ISO dates are read as UTC, matching how the index stores them.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(whole_millis)),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(millis) = text.parse::<i64>() {
                return Some(millis);
            }
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.timestamp_millis());
            }
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc().timestamp_millis())
        }
        _ => None,
    }
}

/// Float timestamps are accepted only when they hold a whole millisecond
/// count that fits in an `i64`.
fn whole_millis(millis: f64) -> Option<i64> {
    let in_range = millis >= i64::MIN as f64 && millis < i64::MAX as f64;
    (millis.fract() == 0.0 && in_range).then_some(millis as i64)
}

pub fn parse_offset(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}
