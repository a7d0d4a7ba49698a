use std::sync::Arc;

use tracing::debug;

use crate::anchor::Anchor;
use crate::backend::SearchBackend;
use crate::error::BackendError;
use crate::query::Direction;
use crate::query::FetchRequest;
use crate::query::build;
use crate::record::LogRecord;
use crate::record::RecordKey;
use crate::record::StreamId;

/// Which side of the window a load extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

/// Which end of the stream a goto jumps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// Both halves of an initial load, each already in ascending order.
#[derive(Debug, Default)]
pub struct InitialFetch {
    pub backward: Vec<LogRecord>,
    pub forward: Vec<LogRecord>,
}

/// Turns window intents into backend requests and normalizes the answers.
#[derive(Clone)]
pub struct FetchCoordinator {
    backend: Arc<dyn SearchBackend>,
    load_size: usize,
}

impl FetchCoordinator {
    pub fn new(backend: Arc<dyn SearchBackend>, load_size: usize) -> Self {
        Self { backend, load_size }
    }

    pub fn load_size(&self) -> usize {
        self.load_size
    }

    /// Load around `anchor`. A seek anchor fetches both directions
    /// concurrently and fails as a whole if either side fails.
    pub async fn fetch_initial(&self, anchor: &Anchor) -> Result<InitialFetch, BackendError> {
        if anchor.is_tail() {
            let request = build(anchor, Direction::Desc, true, self.load_size);
            let backward = self.run(&request).await?;
            return Ok(InitialFetch {
                backward,
                forward: Vec::new(),
            });
        }

        let before = build(anchor, Direction::Desc, false, self.load_size);
        let after = build(anchor, Direction::Asc, true, self.load_size);
        let (backward, forward) = tokio::try_join!(self.run(&before), self.run(&after))?;
        Ok(InitialFetch { backward, forward })
    }

    /// Page away from the current window edge, excluding the edge record.
    pub async fn fetch_more(
        &self,
        stream: &StreamId,
        edge_key: RecordKey,
        edge: Edge,
        size: usize,
    ) -> Result<Vec<LogRecord>, BackendError> {
        let direction = match edge {
            Edge::Top => Direction::Desc,
            Edge::Bottom => Direction::Asc,
        };
        let request = FetchRequest::relative(stream.clone(), edge_key, direction, false, size);
        self.run(&request).await
    }

    /// Extend a window that has no records yet. The anchor stands in for the
    /// missing edge record.
    pub async fn fetch_more_from_anchor(
        &self,
        anchor: &Anchor,
        edge: Edge,
        size: usize,
    ) -> Result<Vec<LogRecord>, BackendError> {
        let request = match (anchor.is_tail(), edge) {
            (true, Edge::Top) => return Ok(Vec::new()),
            (true, Edge::Bottom) => build(anchor, Direction::Desc, true, size),
            (false, Edge::Top) => build(anchor, Direction::Desc, false, size),
            (false, Edge::Bottom) => build(anchor, Direction::Asc, true, size),
        };
        self.run(&request).await
    }

    pub async fn fetch_boundary(
        &self,
        stream: &StreamId,
        which: Boundary,
    ) -> Result<Vec<LogRecord>, BackendError> {
        let direction = match which {
            Boundary::Start => Direction::Asc,
            Boundary::End => Direction::Desc,
        };
        let request = FetchRequest::unbounded(stream.clone(), direction, self.load_size);
        self.run(&request).await
    }

    /// Execute one request and hand back ascending records.
    async fn run(&self, request: &FetchRequest) -> Result<Vec<LogRecord>, BackendError> {
        debug!(
            stream = %request.stream,
            direction = request.direction.as_str(),
            predicate = ?request.predicate,
            size = request.size,
            "issuing range query"
        );
        let mut records = self.backend.search(request).await?;
        if request.direction == Direction::Desc {
            records.reverse();
        }
        Ok(records)
    }
}
