use async_trait::async_trait;
use logreader_window::BackendError;
use logreader_window::FetchRequest;
use logreader_window::LogRecord;
use logreader_window::RecordFields;
use logreader_window::SearchBackend;
use serde_json::Value;
use tracing::debug;
use tracing::warn;
use url::Url;

use crate::config::ElasticsearchConfig;
use crate::dsl::is_ordered;
use crate::dsl::search_body;
use crate::error::ElasticsearchError;
use crate::error::Result;
use crate::response::parse_hits;
use crate::response::status_error;

/// [`SearchBackend`] over an Elasticsearch cluster's `_search` endpoint.
#[derive(Clone)]
pub struct ElasticsearchBackend {
    http: reqwest::Client,
    search_url: Url,
    fields: RecordFields,
}

impl ElasticsearchBackend {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        config.validate().map_err(ElasticsearchError::InvalidConfig)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            search_url: search_url(&config.url, &config.indices)?,
            fields: config.fields.clone(),
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }
}

fn search_url(base: &str, indices: &[String]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|()| ElasticsearchError::InvalidConfig(format!("`{base}` cannot be a base url")))?
        .pop_if_empty()
        .push(&indices.join(","))
        .push("_search");
    Ok(url)
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn search(&self, request: &FetchRequest) -> std::result::Result<Vec<LogRecord>, BackendError> {
        let body = search_body(request, &self.fields);
        debug!(url = %self.search_url, %body, "elasticsearch search");

        let resp = self
            .http
            .post(self.search_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    BackendError::unavailable(format!("request timed out: {err}"))
                } else {
                    BackendError::transport(err.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(err) => format!("<failed to read response body: {err}>"),
            };
            return Err(status_error(status.as_u16(), body));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|err| BackendError::malformed_record(format!("invalid json body: {err}")))?;

        let parsed = parse_hits(body, &self.fields)?;
        if parsed.partial {
            warn!(stream = %request.stream, "elasticsearch answered from a partial set of shards");
        }
        let keys: Vec<_> = parsed.records.iter().map(LogRecord::key).collect();
        if !is_ordered(&keys, request.direction) {
            warn!(
                stream = %request.stream,
                "hits did not come back in {} order",
                request.direction.as_str()
            );
        }
        Ok(parsed.records)
    }
}
