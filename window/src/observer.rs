use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::WindowError;
use crate::manager::Generation;
use crate::manager::WindowSnapshot;

/// Consumer side of a log view. Every method defaults to a no-op so a
/// consumer only implements what it renders.
pub trait WindowObserver: Send + Sync {
    fn on_window_changed(&self, _snapshot: Arc<WindowSnapshot>, _generation: Generation) {}

    fn on_error(&self, _error: &WindowError) {}

    fn on_loading_state_changed(&self, _loading: bool) {}

    /// Follow mode appended records; the consumer should scroll to the bottom.
    fn on_scroll_to_bottom(&self, _generation: Generation) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl WindowObserver for NoopObserver {}

#[derive(Debug, Clone)]
pub enum WindowEvent {
    WindowChanged {
        snapshot: Arc<WindowSnapshot>,
        generation: Generation,
    },
    Error(WindowError),
    LoadingChanged(bool),
    ScrollToBottom(Generation),
}

/// Forwards observer callbacks into a channel, for consumers that run their
/// own event loop.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<WindowEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WindowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: WindowEvent) {
        // A closed receiver means the consumer detached; nothing left to tell.
        let _ = self.tx.send(event);
    }
}

impl WindowObserver for ChannelObserver {
    fn on_window_changed(&self, snapshot: Arc<WindowSnapshot>, generation: Generation) {
        self.send(WindowEvent::WindowChanged {
            snapshot,
            generation,
        });
    }

    fn on_error(&self, error: &WindowError) {
        self.send(WindowEvent::Error(error.clone()));
    }

    fn on_loading_state_changed(&self, loading: bool) {
        self.send(WindowEvent::LoadingChanged(loading));
    }

    fn on_scroll_to_bottom(&self, generation: Generation) {
        self.send(WindowEvent::ScrollToBottom(generation));
    }
}
