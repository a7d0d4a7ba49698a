//! Resolving the externally owned filter selection into an [`Anchor`].

use std::sync::PoisonError;
use std::sync::RwLock;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::config::SelectionFields;
use crate::error::SelectionError;
use crate::record::RecordKey;
use crate::record::StreamId;
use crate::record::parse_offset;
use crate::record::parse_timestamp;

/// One key/value filter held by the selection store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub field: String,
    pub value: Value,
}

impl FilterEntry {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Read side of the filter store owned by the surrounding dashboard.
pub trait SelectionStore: Send + Sync {
    fn list(&self) -> Vec<FilterEntry>;
}

/// Where inside the stream the window is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorPosition {
    /// End of file: show the most recent records.
    Tail,
    Seek(RecordKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub stream: StreamId,
    pub position: AnchorPosition,
}

impl Anchor {
    pub fn tail(stream: StreamId) -> Self {
        Self {
            stream,
            position: AnchorPosition::Tail,
        }
    }

    pub fn seek(stream: StreamId, key: RecordKey) -> Self {
        Self {
            stream,
            position: AnchorPosition::Seek(key),
        }
    }

    pub fn is_tail(&self) -> bool {
        matches!(self.position, AnchorPosition::Tail)
    }

    pub fn key(&self) -> Option<RecordKey> {
        match self.position {
            AnchorPosition::Tail => None,
            AnchorPosition::Seek(key) => Some(key),
        }
    }
}

/// Derive the anchor from the current selection.
///
/// Host and file are mandatory and must be unique. Timestamp and offset are
/// optional but travel together; when both are absent the anchor is the tail.
pub fn resolve(store: &dyn SelectionStore, fields: &SelectionFields) -> Result<Anchor, SelectionError> {
    let entries = store.list();

    let hosts = values_for(&entries, &fields.host);
    let host = match hosts.as_slice() {
        [] => {
            return Err(SelectionError::MissingHost {
                field: fields.host.clone(),
            });
        }
        [value] => scalar_text(&fields.host, value)?,
        many => {
            return Err(SelectionError::AmbiguousHost {
                field: fields.host.clone(),
                count: many.len(),
            });
        }
    };

    let files = values_for(&entries, &fields.file);
    let file = match files.as_slice() {
        [] => {
            return Err(SelectionError::MissingFile {
                field: fields.file.clone(),
            });
        }
        [value] => scalar_text(&fields.file, value)?,
        many => {
            return Err(SelectionError::AmbiguousFile {
                field: fields.file.clone(),
                count: many.len(),
            });
        }
    };

    let stream = StreamId { host, file };
    let timestamps = values_for(&entries, &fields.timestamp);
    let offsets = values_for(&entries, &fields.offset);
    if timestamps.len() > 1 || offsets.len() > 1 {
        return Err(SelectionError::AmbiguousAnchor {
            reason: format!(
                "{} `{}` and {} `{}` filters selected, need at most one of each",
                timestamps.len(),
                fields.timestamp,
                offsets.len(),
                fields.offset
            ),
        });
    }

    match (timestamps.first(), offsets.first()) {
        (None, None) => Ok(Anchor::tail(stream)),
        (Some(timestamp), Some(offset)) => {
            let timestamp = parse_timestamp(timestamp).ok_or_else(|| SelectionError::InvalidValue {
                field: fields.timestamp.clone(),
                value: timestamp.to_string(),
            })?;
            let offset = parse_offset(offset).ok_or_else(|| SelectionError::InvalidValue {
                field: fields.offset.clone(),
                value: offset.to_string(),
            })?;
            Ok(Anchor::seek(stream, RecordKey { timestamp, offset }))
        }
        (Some(_), None) => Err(SelectionError::AmbiguousAnchor {
            reason: format!("`{}` selected without `{}`", fields.timestamp, fields.offset),
        }),
        (None, Some(_)) => Err(SelectionError::AmbiguousAnchor {
            reason: format!("`{}` selected without `{}`", fields.offset, fields.timestamp),
        }),
    }
}

fn values_for<'a>(entries: &'a [FilterEntry], field: &str) -> Vec<&'a Value> {
    entries
        .iter()
        .filter(|entry| entry.field == field)
        .map(|entry| &entry.value)
        .collect()
}

fn scalar_text(field: &str, value: &Value) -> Result<String, SelectionError> {
    match value {
        Value::String(text) if !text.is_empty() => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(SelectionError::InvalidValue {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

/// In-process selection store.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    entries: RwLock<Vec<FilterEntry>>,
}

impl MemorySelectionStore {
    pub fn new(entries: Vec<FilterEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Add an entry without touching existing ones for the same field.
    pub fn push(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.write().push(FilterEntry::new(field, value));
    }

    /// Replace every entry for `field` with a single one.
    pub fn set(&self, field: &str, value: impl Into<Value>) {
        let mut entries = self.write();
        entries.retain(|entry| entry.field != field);
        entries.push(FilterEntry::new(field, value));
    }

    pub fn remove(&self, field: &str) {
        self.write().retain(|entry| entry.field != field);
    }

    pub fn replace_all(&self, entries: Vec<FilterEntry>) {
        *self.write() = entries;
    }

    /// Point the selection at a specific line, as picking a row does.
    pub fn set_anchor(&self, key: RecordKey, fields: &SelectionFields) {
        let mut entries = self.write();
        entries.retain(|entry| entry.field != fields.timestamp && entry.field != fields.offset);
        entries.push(FilterEntry::new(fields.timestamp.clone(), key.timestamp));
        entries.push(FilterEntry::new(fields.offset.clone(), key.offset));
    }

    pub fn clear_anchor(&self, fields: &SelectionFields) {
        self.write()
            .retain(|entry| entry.field != fields.timestamp && entry.field != fields.offset);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<FilterEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SelectionStore for MemorySelectionStore {
    fn list(&self) -> Vec<FilterEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
