use std::sync::Arc;
use std::time::Duration;

use logreader_window::ChannelObserver;
use logreader_window::LogView;
use logreader_window::MemorySelectionStore;
use logreader_window::NoopObserver;
use logreader_window::SelectionError;
use logreader_window::WindowConfig;
use logreader_window::WindowError;
use logreader_window::WindowEvent;
use logreader_window::WindowPhase;
use pretty_assertions::assert_eq;

use crate::common::TestBackend;
use crate::common::drain;
use crate::common::records;
use crate::common::settle;
use crate::common::stream;

fn store_for(file: &str) -> Arc<MemorySelectionStore> {
    let store = MemorySelectionStore::default();
    store.set("host.raw", "h1");
    store.set("file.raw", file);
    Arc::new(store)
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_issues_one_reset_with_final_selection() {
    let backend = TestBackend::new();
    for file in ["f1", "f2", "f3", "f4", "f5"] {
        backend.append(&stream(file), records(0, 10));
    }
    let store = store_for("f1");
    let view = LogView::new(
        WindowConfig::default(),
        backend.clone(),
        store.clone(),
        Arc::new(NoopObserver),
    )
    .unwrap();

    for file in ["f1", "f2", "f3", "f4", "f5"] {
        store.set("file.raw", file);
        view.notify_selection_changed();
        settle(Duration::from_millis(20)).await;
    }
    assert_eq!(backend.request_count(), 0);

    settle(Duration::from_millis(150)).await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].stream, stream("f5"));
    assert_eq!(view.window().stream(), Some(&stream("f5")));
}

#[tokio::test(start_paused = true)]
async fn debounce_interval_comes_from_config() {
    let backend = TestBackend::new();
    backend.append(&stream("f1"), records(0, 3));
    let config = WindowConfig {
        debounce_ms: 500,
        ..WindowConfig::default()
    };
    let view = LogView::new(config, backend.clone(), store_for("f1"), Arc::new(NoopObserver))
        .unwrap();

    view.notify_selection_changed();
    settle(Duration::from_millis(300)).await;
    assert_eq!(backend.request_count(), 0);

    settle(Duration::from_millis(300)).await;
    assert_eq!(backend.request_count(), 1);
    assert_eq!(view.window().records().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn debounced_invalid_selection_empties_view() {
    let backend = TestBackend::new();
    backend.append(&stream("f1"), records(0, 3));
    let store = store_for("f1");
    let (observer, mut rx) = ChannelObserver::new();
    let view = LogView::new(
        WindowConfig::default(),
        backend.clone(),
        store.clone(),
        Arc::new(observer),
    )
    .unwrap();
    view.refresh().await.unwrap();
    drain(&mut rx);

    store.remove("file.raw");
    view.notify_selection_changed();
    settle(Duration::from_millis(200)).await;

    let window = view.window();
    assert_eq!(window.phase, WindowPhase::Empty);
    assert!(window.records().is_empty());
    assert_eq!(backend.request_count(), 1);
    let errors: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            WindowEvent::Error(err) => Some(err),
            _ => None,
        })
        .collect();
    assert_eq!(
        errors,
        vec![WindowError::Selection(SelectionError::MissingFile {
            field: "file.raw".to_string(),
        })]
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_pending_refresh() {
    let backend = TestBackend::new();
    let view = LogView::new(
        WindowConfig::default(),
        backend.clone(),
        store_for("f1"),
        Arc::new(NoopObserver),
    )
    .unwrap();

    view.notify_selection_changed();
    view.shutdown();
    settle(Duration::from_millis(500)).await;

    assert_eq!(backend.request_count(), 0);
}
