use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::anchor;
use crate::anchor::SelectionStore;
use crate::backend::SearchBackend;
use crate::config::WindowConfig;
use crate::debounce::RefreshDebouncer;
use crate::debounce::RefreshTarget;
use crate::error::ConfigError;
use crate::error::Result;
use crate::fetch::Boundary;
use crate::fetch::Edge;
use crate::fetch::FetchCoordinator;
use crate::follow::FollowController;
use crate::manager::LoadOutcome;
use crate::manager::WindowManager;
use crate::manager::WindowSnapshot;
use crate::observer::WindowObserver;

/// One open log view: a window over the stream named by a selection store,
/// kept in sync with that store and optionally following the stream's end.
///
/// Must be created inside a tokio runtime; the debounce loop is spawned on
/// construction.
pub struct LogView {
    inner: Arc<ViewInner>,
    debouncer: RefreshDebouncer,
}

struct ViewInner {
    config: WindowConfig,
    store: Arc<dyn SelectionStore>,
    manager: WindowManager,
    follow: FollowController,
}

impl LogView {
    pub fn new(
        config: WindowConfig,
        backend: Arc<dyn SearchBackend>,
        store: Arc<dyn SelectionStore>,
        observer: Arc<dyn WindowObserver>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;

        let coordinator = FetchCoordinator::new(backend, config.load_size);
        let manager = WindowManager::new(coordinator, Arc::clone(&observer));
        let follow = FollowController::new(
            manager.clone(),
            observer,
            config.follow_interval(),
            config.follow_load_size,
        );
        let inner = Arc::new(ViewInner {
            config,
            store,
            manager,
            follow,
        });
        let debouncer = RefreshDebouncer::spawn(inner.clone(), inner.config.debounce());
        Ok(Self { inner, debouncer })
    }

    /// Tell the view the selection changed. The refresh runs once changes
    /// stop arriving for the configured debounce interval.
    pub fn notify_selection_changed(&self) {
        self.debouncer.notify();
    }

    /// Re-read the selection now and reset the window to it, skipping the
    /// debounce.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.inner.refresh_now().await
    }

    /// Page one load-size step at `edge`.
    pub async fn load_more(&self, edge: Edge) -> Result<LoadOutcome> {
        self.inner
            .manager
            .load_more(edge, self.inner.config.load_size)
            .await
    }

    pub async fn goto(&self, which: Boundary) -> Result<LoadOutcome> {
        self.inner.follow.disable();
        self.inner.manager.goto_boundary(which).await
    }

    /// Turn follow mode on or off; returns whether it is on afterwards.
    pub fn set_follow(&self, enabled: bool) -> bool {
        if enabled {
            self.inner.follow.enable()
        } else {
            self.inner.follow.disable();
            false
        }
    }

    pub fn is_following(&self) -> bool {
        self.inner.follow.is_enabled()
    }

    pub fn window(&self) -> WindowSnapshot {
        self.inner.manager.snapshot()
    }

    pub fn manager(&self) -> &WindowManager {
        &self.inner.manager
    }

    pub fn config(&self) -> &WindowConfig {
        &self.inner.config
    }

    /// Stop background work. The window keeps its last state.
    pub fn shutdown(&self) {
        self.debouncer.shutdown();
        self.inner.follow.disable();
    }
}

impl Drop for LogView {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ViewInner {
    async fn refresh_now(&self) -> Result<LoadOutcome> {
        self.follow.disable();
        match anchor::resolve(self.store.as_ref(), &self.config.selection) {
            Ok(anchor) => self.manager.reset(anchor).await,
            Err(err) => {
                self.manager.reject_selection(err.clone());
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl RefreshTarget for ViewInner {
    async fn refresh(&self) {
        // Failures already reached the observer.
        if let Err(err) = self.refresh_now().await {
            debug!("debounced refresh failed: {err}");
        }
    }
}
