use std::sync::Arc;

use logreader_elasticsearch::ElasticsearchBackend;
use logreader_elasticsearch::ElasticsearchConfig;
use logreader_window::Edge;
use logreader_window::LoadOutcome;
use logreader_window::LogRecord;
use logreader_window::LogView;
use logreader_window::MemorySelectionStore;
use logreader_window::NoopObserver;
use logreader_window::WindowConfig;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_partial_json;
use wiremock::matchers::method;

fn hits(offsets: &[u64]) -> Value {
    let hits: Vec<Value> = offsets
        .iter()
        .map(|offset| {
            json!({ "_source": {
                "@timestamp": format!("2015-03-01T10:00:{:02}.000Z", offset % 60),
                "offset": offset,
                "message": format!("line {offset}"),
            } })
        })
        .collect();
    json!({ "hits": { "hits": hits } })
}

#[tokio::test]
async fn tail_view_over_elasticsearch_is_ascending() {
    let server = MockServer::start().await;
    // Initial tail load: newest first, as the cluster sorts descending.
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "sort": [ { "@timestamp": { "order": "desc" } } ] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[12, 11, 10])))
        .mount(&server)
        .await;
    // Paging below the bottom record.
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "sort": [ { "@timestamp": { "order": "asc" } } ] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[13, 14])))
        .mount(&server)
        .await;

    let backend = ElasticsearchBackend::new(&ElasticsearchConfig {
        url: server.uri(),
        ..ElasticsearchConfig::default()
    })
    .expect("backend");
    let store = Arc::new(MemorySelectionStore::default());
    store.set("host.raw", "web-01");
    store.set("file.raw", "/var/log/app.log");
    let config = WindowConfig {
        load_size: 3,
        ..WindowConfig::default()
    };
    let view = LogView::new(config, Arc::new(backend), store, Arc::new(NoopObserver))
        .expect("view");

    assert_eq!(
        view.refresh().await.expect("refresh"),
        LoadOutcome::Applied { added: 3 }
    );
    assert_eq!(
        view.load_more(Edge::Bottom).await.expect("page"),
        LoadOutcome::Applied { added: 2 }
    );

    let window = view.window();
    let offsets: Vec<u64> = window.records().iter().map(LogRecord::offset).collect();
    assert_eq!(offsets, vec![10, 11, 12, 13, 14]);
    assert!(window.at_end);
}
