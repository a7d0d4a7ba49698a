//! Range queries over the composite `(timestamp, offset)` key.

use serde::Deserialize;
use serde::Serialize;

use crate::anchor::Anchor;
use crate::record::RecordKey;
use crate::record::StreamId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Restriction on the composite key. Comparison is lexicographic: timestamp
/// first, offset as the tie breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPredicate {
    None,
    Lt(RecordKey),
    Le(RecordKey),
    Gt(RecordKey),
    Ge(RecordKey),
}

impl KeyPredicate {
    pub fn matches(&self, key: RecordKey) -> bool {
        match *self {
            KeyPredicate::None => true,
            KeyPredicate::Lt(bound) => key < bound,
            KeyPredicate::Le(bound) => key <= bound,
            KeyPredicate::Gt(bound) => key > bound,
            KeyPredicate::Ge(bound) => key >= bound,
        }
    }

    pub fn bound(&self) -> Option<RecordKey> {
        match *self {
            KeyPredicate::None => None,
            KeyPredicate::Lt(bound)
            | KeyPredicate::Le(bound)
            | KeyPredicate::Gt(bound)
            | KeyPredicate::Ge(bound) => Some(bound),
        }
    }

    fn relative_to(key: RecordKey, direction: Direction, inclusive: bool) -> Self {
        match (direction, inclusive) {
            (Direction::Desc, true) => KeyPredicate::Le(key),
            (Direction::Desc, false) => KeyPredicate::Lt(key),
            (Direction::Asc, true) => KeyPredicate::Ge(key),
            (Direction::Asc, false) => KeyPredicate::Gt(key),
        }
    }
}

/// One immutable query against a single log stream.
///
/// Results come back ordered by `direction` and truncated to `size`; callers
/// re-ascend descending results before merging them into a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub stream: StreamId,
    pub predicate: KeyPredicate,
    pub direction: Direction,
    pub size: usize,
}

impl FetchRequest {
    /// Everything on either side of `key`, paging away from it.
    pub fn relative(
        stream: StreamId,
        key: RecordKey,
        direction: Direction,
        inclusive: bool,
        size: usize,
    ) -> Self {
        Self {
            stream,
            predicate: KeyPredicate::relative_to(key, direction, inclusive),
            direction,
            size,
        }
    }

    /// The whole stream from one end.
    pub fn unbounded(stream: StreamId, direction: Direction, size: usize) -> Self {
        Self {
            stream,
            predicate: KeyPredicate::None,
            direction,
            size,
        }
    }
}

/// Build the request for `anchor`. A tail anchor ignores `direction` and
/// `inclusive` and always asks for the most recent `size` records.
pub fn build(anchor: &Anchor, direction: Direction, inclusive: bool, size: usize) -> FetchRequest {
    match anchor.key() {
        Some(key) => FetchRequest::relative(anchor.stream.clone(), key, direction, inclusive, size),
        None => FetchRequest::unbounded(anchor.stream.clone(), Direction::Desc, size),
    }
}
