use logreader_window::BackendError;
use logreader_window::LogRecord;
use logreader_window::RecordFields;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    timed_out: bool,
    #[serde(rename = "_shards")]
    shards: Option<Shards>,
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Shards {
    #[serde(default)]
    failed: u64,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Option<Map<String, Value>>,
}

/// Hits of a successful search, plus whether the cluster answered partially.
#[derive(Debug)]
pub struct ParsedHits {
    pub records: Vec<LogRecord>,
    pub partial: bool,
}

/// Decode a 2xx `_search` body.
pub fn parse_hits(body: Value, fields: &RecordFields) -> Result<ParsedHits, BackendError> {
    if let Some(error) = body.get("error") {
        return Err(BackendError::query(error_reason(error)));
    }
    let response: SearchResponse = serde_json::from_value(body)
        .map_err(|err| BackendError::malformed_record(format!("unexpected response shape: {err}")))?;
    let partial = response.timed_out || response.shards.is_some_and(|shards| shards.failed > 0);
    let records = response
        .hits
        .hits
        .into_iter()
        .map(|hit| {
            let source = hit
                .source
                .ok_or_else(|| BackendError::malformed_record("hit without `_source`"))?;
            LogRecord::from_source(source, fields)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ParsedHits { records, partial })
}

/// Map a non-2xx answer to the matching error kind.
pub fn status_error(status: u16, body: String) -> BackendError {
    let reason = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error").map(error_reason));
    match (status, reason) {
        (400, Some(reason)) => BackendError::query(reason),
        (429 | 502 | 503 | 504, reason) => {
            BackendError::unavailable(reason.unwrap_or_else(|| format!("status {status}")))
        }
        (status, _) => BackendError::Status { status, body },
    }
}

/// Elasticsearch reports errors either as a string or as an object with a
/// `reason` (and usually a more specific `root_cause`).
fn error_reason(error: &Value) -> String {
    if let Some(text) = error.as_str() {
        return text.to_string();
    }
    let root = error
        .get("root_cause")
        .and_then(Value::as_array)
        .and_then(|causes| causes.first())
        .and_then(|cause| cause.get("reason"))
        .and_then(Value::as_str);
    root.or_else(|| error.get("reason").and_then(Value::as_str))
        .map_or_else(|| error.to_string(), str::to_string)
}
