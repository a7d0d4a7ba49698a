use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use logreader_async_utils::sleep_or_cancel;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::fetch::Edge;
use crate::manager::Generation;
use crate::manager::LoadOutcome;
use crate::manager::WindowManager;
use crate::observer::WindowObserver;

/// Live-tail polling for a window that sits at the end of its stream.
///
/// The first poll runs as soon as follow is enabled, then one per interval.
/// Polls are tied to the generation that was current when follow was
/// enabled; any re-anchor ends the loop on its next tick.
pub struct FollowController {
    manager: WindowManager,
    observer: Arc<dyn WindowObserver>,
    interval: Duration,
    load_size: usize,
    active: Mutex<Option<FollowTask>>,
}

struct FollowTask {
    token: CancellationToken,
    generation: Generation,
}

impl FollowController {
    pub fn new(
        manager: WindowManager,
        observer: Arc<dyn WindowObserver>,
        interval: Duration,
        load_size: usize,
    ) -> Self {
        Self {
            manager,
            observer,
            interval,
            load_size,
            active: Mutex::new(None),
        }
    }

    /// Start following. Returns whether follow is on afterwards; it can only
    /// be turned on while the window shows the end of a stream.
    pub fn enable(&self) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.manager.snapshot();
        if let Some(task) = active.as_ref()
            && !task.token.is_cancelled()
            && task.generation == snapshot.generation
        {
            return true;
        }
        if !snapshot.at_end || snapshot.stream().is_none() {
            debug!("follow requested but the window is not at the end of a stream");
            return false;
        }
        if let Some(task) = active.take() {
            task.token.cancel();
        }

        let token = CancellationToken::new();
        let generation = snapshot.generation;
        info!(generation, interval = ?self.interval, "follow enabled");
        tokio::spawn(poll(
            self.manager.clone(),
            Arc::clone(&self.observer),
            generation,
            self.interval,
            self.load_size,
            token.clone(),
        ));
        *active = Some(FollowTask { token, generation });
        true
    }

    /// Stop polling. A poll already in flight still lands in the window, but
    /// it will not trigger a scroll.
    pub fn disable(&self) {
        let task = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task
            && !task.token.is_cancelled()
        {
            task.token.cancel();
            info!(generation = task.generation, "follow disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.token.is_cancelled())
    }
}

impl Drop for FollowController {
    fn drop(&mut self) {
        self.disable();
    }
}

async fn poll(
    manager: WindowManager,
    observer: Arc<dyn WindowObserver>,
    generation: Generation,
    interval: Duration,
    load_size: usize,
    token: CancellationToken,
) {
    loop {
        if manager.generation() != generation {
            debug!(generation, "window re-anchored; follow loop ending");
            break;
        }
        // Cancellation does not abort the fetch itself; it only stops the
        // loop from acting on the result.
        let outcome = manager.load_more(Edge::Bottom, load_size).await;
        if token.is_cancelled() {
            break;
        }
        match outcome {
            Ok(LoadOutcome::Applied { added }) => {
                debug!(generation, added, "follow poll applied");
                observer.on_scroll_to_bottom(generation);
            }
            Ok(LoadOutcome::Stale) | Ok(LoadOutcome::Detached) => break,
            Ok(LoadOutcome::Busy) => {}
            Err(err) => warn!(generation, "follow poll failed: {err}"),
        }
        if sleep_or_cancel(interval, &token).await.is_err() {
            break;
        }
    }
    token.cancel();
}
