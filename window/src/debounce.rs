use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Sleep;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

/// Whatever the debouncer should kick once the selection settles.
#[async_trait]
pub trait RefreshTarget: Send + Sync + 'static {
    async fn refresh(&self);
}

/// Collapses bursts of selection-change notifications into one refresh.
///
/// Each notification restarts the quiet period; the refresh fires once no
/// notification has arrived for `delay`. The target reads the selection when
/// the refresh runs, so only the final state of a burst is ever loaded.
pub struct RefreshDebouncer {
    tx: mpsc::UnboundedSender<()>,
    shutdown: CancellationToken,
}

impl RefreshDebouncer {
    /// Start the debounce loop on the current tokio runtime.
    pub fn spawn(target: Arc<dyn RefreshTarget>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        tokio::spawn(run(target, delay, rx, shutdown.clone()));
        Self { tx, shutdown }
    }

    pub fn notify(&self) {
        if self.tx.send(()).is_err() {
            trace!("refresh debouncer stopped; notification dropped");
        }
    }

    /// Stop the loop. A pending refresh that has not fired is discarded.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for RefreshDebouncer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run(
    target: Arc<dyn RefreshTarget>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<()>,
    shutdown: CancellationToken,
) {
    let mut timer: Option<Pin<Box<Sleep>>> = None;
    let mut coalesced = 0usize;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            maybe = rx.recv() => {
                if maybe.is_none() {
                    break;
                }
                coalesced += 1;
                timer = Some(Box::pin(sleep(delay)));
            }
            _ = async {
                if let Some(timer) = &mut timer {
                    timer.await;
                }
            }, if timer.is_some() => {
                timer = None;
                debug!(coalesced, "selection settled; refreshing log window");
                coalesced = 0;
                let target = Arc::clone(&target);
                tokio::spawn(async move { target.refresh().await });
            }
        }
    }
    trace!("refresh debouncer loop exited");
}
