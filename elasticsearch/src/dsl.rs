//! Rendering [`FetchRequest`]s into the search DSL.
//!
//! The composite key `(timestamp, offset)` has no native ordering in the
//! index, so a bound like `key < (T, O)` is spelled out lexicographically:
//!
//! ```text
//! timestamp < T  OR  (timestamp == T AND offset < O)
//! ```

use logreader_window::Direction;
use logreader_window::FetchRequest;
use logreader_window::KeyPredicate;
use logreader_window::RecordFields;
use logreader_window::RecordKey;
use serde_json::Value;
use serde_json::json;

/// Full `_search` body for `request`.
pub fn search_body(request: &FetchRequest, fields: &RecordFields) -> Value {
    let mut filters = vec![
        json!({ "term": { fields.host.as_str(): request.stream.host } }),
        json!({ "term": { fields.file.as_str(): request.stream.file } }),
    ];
    if let Some(clause) = key_clause(request.predicate, fields) {
        filters.push(clause);
    }
    let order = request.direction.as_str();
    json!({
        "size": request.size,
        "query": { "bool": { "filter": filters } },
        "sort": [
            { fields.timestamp.as_str(): { "order": order } },
            { fields.offset.as_str(): { "order": order } },
        ],
    })
}

fn key_clause(predicate: KeyPredicate, fields: &RecordFields) -> Option<Value> {
    let (strict, offset_op, key) = match predicate {
        KeyPredicate::None => return None,
        KeyPredicate::Lt(key) => ("lt", "lt", key),
        KeyPredicate::Le(key) => ("lt", "lte", key),
        KeyPredicate::Gt(key) => ("gt", "gt", key),
        KeyPredicate::Ge(key) => ("gt", "gte", key),
    };
    let RecordKey { timestamp, offset } = key;
    Some(json!({
        "bool": {
            "should": [
                { "range": { fields.timestamp.as_str(): { strict: timestamp, "format": "epoch_millis" } } },
                {
                    "bool": {
                        "filter": [
                            { "range": { fields.timestamp.as_str(): {
                                "gte": timestamp,
                                "lte": timestamp,
                                "format": "epoch_millis",
                            } } },
                            { "range": { fields.offset.as_str(): { offset_op: offset } } },
                        ]
                    }
                },
            ],
            "minimum_should_match": 1,
        }
    }))
}

/// The sort order a response must come back in, used to sanity check hits.
pub fn is_ordered(keys: &[RecordKey], direction: Direction) -> bool {
    keys.windows(2).all(|pair| match direction {
        Direction::Asc => pair[0] <= pair[1],
        Direction::Desc => pair[0] >= pair[1],
    })
}
