use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use logreader_window::BackendError;
use logreader_window::Direction;
use logreader_window::FetchRequest;
use logreader_window::LogRecord;
use logreader_window::MemoryBackend;
use logreader_window::RecordKey;
use logreader_window::SearchBackend;
use logreader_window::StreamId;
use logreader_window::WindowEvent;
use serde_json::Map;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn stream(file: &str) -> StreamId {
    StreamId::new("h1", file)
}

pub fn record(timestamp: i64, offset: u64) -> LogRecord {
    let mut fields = Map::new();
    fields.insert("message".to_string(), json!(format!("line {offset}")));
    LogRecord::new(RecordKey::new(timestamp, offset), fields)
}

/// One record per second, offsets counting up from `start`.
pub fn records(start: u64, count: u64) -> Vec<LogRecord> {
    (start..start + count)
        .map(|offset| record(offset as i64 * 1_000, offset))
        .collect()
}

pub fn offsets(records: &[LogRecord]) -> Vec<u64> {
    records.iter().map(LogRecord::offset).collect()
}

/// In-memory backend that records every request and can be told to stall,
/// fail, delay one direction, or answer with a canned response.
pub struct TestBackend {
    store: MemoryBackend,
    requests: Mutex<Vec<FetchRequest>>,
    held: Mutex<Option<StreamId>>,
    gate: Semaphore,
    failing: AtomicBool,
    delays: Mutex<HashMap<Direction, Duration>>,
    scripted: Mutex<Option<Vec<LogRecord>>>,
}

impl TestBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store: MemoryBackend::new(),
            requests: Mutex::new(Vec::new()),
            held: Mutex::new(None),
            gate: Semaphore::new(0),
            failing: AtomicBool::new(false),
            delays: Mutex::new(HashMap::new()),
            scripted: Mutex::new(None),
        })
    }

    pub fn append(&self, stream: &StreamId, records: Vec<LogRecord>) {
        self.store.append(stream, records);
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests for `stream` wait until [`TestBackend::release`] is called.
    pub fn hold(&self, stream: &StreamId) {
        *self.held.lock().unwrap() = Some(stream.clone());
    }

    /// Let `n` held requests through, in arrival order.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn delay(&self, direction: Direction, delay: Duration) {
        self.delays.lock().unwrap().insert(direction, delay);
    }

    /// Answer the next request with `records`, whatever it asks for.
    pub fn script_next(&self, records: Vec<LogRecord>) {
        *self.scripted.lock().unwrap() = Some(records);
    }

    pub async fn wait_for_requests(&self, count: usize) {
        for _ in 0..10_000 {
            if self.request_count() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "expected {count} requests, saw {}",
            self.request_count()
        );
    }
}

#[async_trait]
impl SearchBackend for TestBackend {
    async fn search(&self, request: &FetchRequest) -> Result<Vec<LogRecord>, BackendError> {
        self.requests.lock().unwrap().push(request.clone());

        let held = self.held.lock().unwrap().as_ref() == Some(&request.stream);
        if held {
            self.gate
                .acquire()
                .await
                .map_err(|_| BackendError::unavailable("gate closed"))?
                .forget();
        }
        let delay = self.delays.lock().unwrap().get(&request.direction).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("cluster red"));
        }
        let scripted = self.scripted.lock().unwrap().take();
        if let Some(records) = scripted {
            return Ok(records);
        }
        self.store.search(request).await
    }
}

/// Advance (paused) time and let spawned tasks catch up.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn drain(rx: &mut UnboundedReceiver<WindowEvent>) -> Vec<WindowEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
