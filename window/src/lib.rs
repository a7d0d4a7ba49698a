/*!
# Log Window

A bidirectional, bounded window over one append-only log stream held in a
search backend. Records are ordered by `(timestamp, offset)`; the window is
loaded around an anchor, paged at either edge, jumped to either end of the
stream, and optionally kept at the live end by polling.

## Architecture

```text
selection change ─> RefreshDebouncer ─> anchor::resolve ─> WindowManager::reset
                                                                  │
                 FollowController (timer) ─> WindowManager::load_more
                                                                  │
                                        FetchCoordinator ─> query::build
                                                                  │
                                                           SearchBackend
```

`LogView` wires these together for one open view. Everything that touches
the backend is async; results reach the consumer through a
[`WindowObserver`].
*/

pub mod anchor;
pub mod backend;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod follow;
pub mod manager;
pub mod observer;
pub mod query;
pub mod record;
pub mod view;
pub mod window;

pub use anchor::Anchor;
pub use anchor::AnchorPosition;
pub use anchor::FilterEntry;
pub use anchor::MemorySelectionStore;
pub use anchor::SelectionStore;
pub use backend::MemoryBackend;
pub use backend::SearchBackend;
pub use config::RecordFields;
pub use config::SelectionFields;
pub use config::WindowConfig;
pub use debounce::RefreshDebouncer;
pub use debounce::RefreshTarget;
pub use error::BackendError;
pub use error::ConfigError;
pub use error::Result;
pub use error::SelectionError;
pub use error::WindowError;
pub use fetch::Boundary;
pub use fetch::Edge;
pub use fetch::FetchCoordinator;
pub use fetch::InitialFetch;
pub use follow::FollowController;
pub use manager::Generation;
pub use manager::LoadOutcome;
pub use manager::WindowManager;
pub use manager::WindowPhase;
pub use manager::WindowSnapshot;
pub use observer::ChannelObserver;
pub use observer::NoopObserver;
pub use observer::WindowEvent;
pub use observer::WindowObserver;
pub use query::Direction;
pub use query::FetchRequest;
pub use query::KeyPredicate;
pub use record::LogRecord;
pub use record::RecordKey;
pub use record::StreamId;
pub use view::LogView;
pub use window::Window;
