//! # Elasticsearch backend for the log window
//!
//! Implements [`logreader_window::SearchBackend`] against a cluster's
//! `POST /{indices}/_search` endpoint. Each window fetch becomes one search
//! scoped to a single host and file, sorted on the record key and truncated
//! to the requested page size.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use logreader_elasticsearch::ElasticsearchBackend;
//! use logreader_elasticsearch::ElasticsearchConfig;
//! use logreader_window::LogView;
//! use logreader_window::MemorySelectionStore;
//! use logreader_window::NoopObserver;
//! use logreader_window::WindowConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = ElasticsearchBackend::new(&ElasticsearchConfig::default())?;
//! let store = Arc::new(MemorySelectionStore::default());
//! store.set("host.raw", "web-01");
//! store.set("file.raw", "/var/log/app.log");
//! let view = LogView::new(
//!     WindowConfig::default(),
//!     Arc::new(backend),
//!     store,
//!     Arc::new(NoopObserver),
//! )?;
//! view.refresh().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
pub mod dsl;
mod error;
mod response;

pub use backend::ElasticsearchBackend;
pub use config::ElasticsearchConfig;
pub use error::ElasticsearchError;
pub use error::Result;
