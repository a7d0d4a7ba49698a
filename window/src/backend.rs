use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::query::Direction;
use crate::query::FetchRequest;
use crate::record::LogRecord;
use crate::record::StreamId;

/// Executes range/term queries for the engine.
///
/// Implementations return at most `request.size` records of `request.stream`
/// matching `request.predicate`, ordered by key in `request.direction`.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &FetchRequest) -> Result<Vec<LogRecord>, BackendError>;
}

/// Backend over records held in process, kept sorted per stream.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    streams: RwLock<HashMap<StreamId, Vec<LogRecord>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records to a stream. Records whose key is already present replace
    /// the stored copy, mirroring a re-indexed document.
    pub fn append(&self, stream: &StreamId, records: impl IntoIterator<Item = LogRecord>) {
        let mut streams = self
            .streams
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let stored = streams.entry(stream.clone()).or_default();
        for record in records {
            match stored.binary_search_by(|probe| probe.cmp_key(&record)) {
                Ok(idx) => stored[idx] = record,
                Err(idx) => stored.insert(idx, record),
            }
        }
    }

    pub fn len(&self, stream: &StreamId) -> usize {
        self.streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(stream)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, stream: &StreamId) -> bool {
        self.len(stream) == 0
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn search(&self, request: &FetchRequest) -> Result<Vec<LogRecord>, BackendError> {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(stored) = streams.get(&request.stream) else {
            return Ok(Vec::new());
        };
        let matching = stored
            .iter()
            .filter(|record| request.predicate.matches(record.key()));
        let records = match request.direction {
            Direction::Asc => matching.take(request.size).cloned().collect(),
            Direction::Desc => matching.rev().take(request.size).cloned().collect(),
        };
        Ok(records)
    }
}
