use std::sync::Arc;
use std::time::Duration;

use logreader_window::Anchor;
use logreader_window::Boundary;
use logreader_window::ChannelObserver;
use logreader_window::Edge;
use logreader_window::FetchCoordinator;
use logreader_window::LoadOutcome;
use logreader_window::NoopObserver;
use logreader_window::WindowEvent;
use logreader_window::WindowManager;
use logreader_window::WindowPhase;
use pretty_assertions::assert_eq;
use tokio::time::timeout;

use crate::common::TestBackend;
use crate::common::drain;
use crate::common::offsets;
use crate::common::records;
use crate::common::stream;

#[tokio::test]
async fn response_for_replaced_anchor_is_dropped() {
    let backend = TestBackend::new();
    backend.append(&stream("f1"), records(0, 10));
    backend.append(&stream("f2"), records(100, 10));
    let (observer, mut rx) = ChannelObserver::new();
    let manager = WindowManager::new(
        FetchCoordinator::new(backend.clone(), 5),
        Arc::new(observer),
    );

    backend.hold(&stream("f1"));
    let first = tokio::spawn({
        let manager = manager.clone();
        async move { manager.reset(Anchor::tail(stream("f1"))).await }
    });
    backend.wait_for_requests(1).await;
    let stale_generation = manager.generation();

    let outcome = manager.reset(Anchor::tail(stream("f2"))).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Applied { added: 5 });

    backend.release(1);
    assert_eq!(first.await.unwrap(), Ok(LoadOutcome::Stale));

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.stream(), Some(&stream("f2")));
    assert_eq!(offsets(snapshot.records()), vec![105, 106, 107, 108, 109]);
    assert_eq!(snapshot.phase, WindowPhase::Ready);

    let changed_for_stale = drain(&mut rx).into_iter().any(|event| {
        matches!(event, WindowEvent::WindowChanged { generation, .. } if generation == stale_generation)
    });
    assert!(!changed_for_stale);
}

#[tokio::test]
async fn load_more_is_busy_while_loading_and_stale_after_goto() {
    let backend = TestBackend::new();
    let stream = stream("f1");
    backend.append(&stream, records(0, 50));
    let manager = WindowManager::new(
        FetchCoordinator::new(backend.clone(), 5),
        Arc::new(NoopObserver),
    );
    manager.reset(Anchor::tail(stream.clone())).await.unwrap();

    backend.hold(&stream);
    let paging = tokio::spawn({
        let manager = manager.clone();
        async move { manager.load_more(Edge::Top, 5).await }
    });
    backend.wait_for_requests(2).await;
    assert_eq!(manager.phase(), WindowPhase::Loading);

    assert_eq!(
        manager.load_more(Edge::Bottom, 5).await,
        Ok(LoadOutcome::Busy)
    );
    assert_eq!(backend.request_count(), 2);

    let jump = tokio::spawn({
        let manager = manager.clone();
        async move { manager.goto_boundary(Boundary::Start).await }
    });
    backend.wait_for_requests(3).await;

    backend.release(1);
    assert_eq!(paging.await.unwrap(), Ok(LoadOutcome::Stale));
    backend.release(1);
    assert_eq!(jump.await.unwrap(), Ok(LoadOutcome::Applied { added: 5 }));

    assert_eq!(
        offsets(manager.snapshot().records()),
        vec![0, 1, 2, 3, 4]
    );
}

#[tokio::test]
async fn detach_invalidates_in_flight_reset() {
    let backend = TestBackend::new();
    backend.append(&stream("f1"), records(0, 10));
    let manager = WindowManager::new(
        FetchCoordinator::new(backend.clone(), 5),
        Arc::new(NoopObserver),
    );

    backend.hold(&stream("f1"));
    let pending = tokio::spawn({
        let manager = manager.clone();
        async move { manager.reset(Anchor::tail(stream("f1"))).await }
    });
    backend.wait_for_requests(1).await;
    manager.detach();
    backend.release(1);

    assert_eq!(pending.await.unwrap(), Ok(LoadOutcome::Stale));
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.phase, WindowPhase::Empty);
    assert!(snapshot.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn abandoned_load_does_not_leave_window_loading() {
    let backend = TestBackend::new();
    let f1 = stream("f1");
    backend.append(&f1, records(0, 50));
    let manager = WindowManager::new(
        FetchCoordinator::new(backend.clone(), 5),
        Arc::new(NoopObserver),
    );
    manager.reset(Anchor::tail(f1.clone())).await.unwrap();

    backend.hold(&f1);
    let abandoned = timeout(Duration::from_secs(1), manager.load_more(Edge::Top, 5)).await;
    assert!(abandoned.is_err());
    assert_eq!(manager.phase(), WindowPhase::Ready);

    backend.release(1);
    assert_eq!(
        manager.load_more(Edge::Top, 5).await,
        Ok(LoadOutcome::Applied { added: 5 })
    );
    assert_eq!(
        offsets(manager.snapshot().records()),
        (40..50).collect::<Vec<_>>()
    );

    let f2 = stream("f2");
    backend.hold(&f2);
    let abandoned = timeout(Duration::from_secs(1), manager.reset(Anchor::tail(f2.clone()))).await;
    assert!(abandoned.is_err());
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.phase, WindowPhase::Empty);
    assert_eq!(snapshot.stream(), Some(&f2));
    assert!(snapshot.records().is_empty());
}

#[tokio::test]
async fn switching_stream_publishes_the_emptied_window() {
    let backend = TestBackend::new();
    backend.append(&stream("f1"), records(0, 10));
    let (observer, mut rx) = ChannelObserver::new();
    let manager = WindowManager::new(
        FetchCoordinator::new(backend.clone(), 5),
        Arc::new(observer),
    );
    manager.reset(Anchor::tail(stream("f1"))).await.unwrap();
    drain(&mut rx);

    backend.set_failing(true);
    assert!(manager.reset(Anchor::tail(stream("f2"))).await.is_err());

    let emptied = drain(&mut rx).into_iter().find_map(|event| match event {
        WindowEvent::WindowChanged { snapshot, .. } => Some(snapshot),
        _ => None,
    });
    let emptied = emptied.expect("cleared window published");
    assert_eq!(emptied.stream(), Some(&stream("f2")));
    assert!(emptied.records().is_empty());
    assert_eq!(manager.snapshot().records().len(), 0);
}
