//! The window state machine.
//!
//! ```text
//! Empty ──reset/goto──> Loading ──ok──> Ready ──load_more/reset/goto──> Loading
//!                          │
//!                          └──backend error──> Error (last good records kept)
//! ```
//!
//! Every reset, goto and detach bumps the generation. A response is applied
//! only if the generation it was issued under is still current; anything else
//! is dropped on arrival.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::anchor::Anchor;
use crate::error::BackendError;
use crate::error::Result;
use crate::error::SelectionError;
use crate::error::WindowError;
use crate::fetch::Boundary;
use crate::fetch::Edge;
use crate::fetch::FetchCoordinator;
use crate::observer::WindowObserver;
use crate::record::LogRecord;
use crate::record::StreamId;
use crate::window::Window;

/// Identifies which reset/anchor an in-flight fetch belongs to.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Empty,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was merged; `added` counts keys new to the window.
    Applied { added: usize },
    /// Another load is in flight; nothing was issued.
    Busy,
    /// The window was re-anchored while this fetch was in flight.
    Stale,
    /// No stream is selected.
    Detached,
}

impl LoadOutcome {
    pub fn added(&self) -> usize {
        match self {
            LoadOutcome::Applied { added } => *added,
            _ => 0,
        }
    }
}

/// Immutable copy of the window handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub generation: Generation,
    pub phase: WindowPhase,
    pub anchor: Option<Anchor>,
    /// The bottom of the window is the true end of the stream.
    pub at_end: bool,
    pub window: Window,
}

impl WindowSnapshot {
    pub fn records(&self) -> &[LogRecord] {
        self.window.records()
    }

    pub fn stream(&self) -> Option<&StreamId> {
        self.anchor.as_ref().map(|anchor| &anchor.stream)
    }

    /// Row of the record the selection points at, if it is loaded.
    pub fn anchor_index(&self) -> Option<usize> {
        let key = self.anchor.as_ref()?.key()?;
        self.window.position_of(key)
    }
}

struct WindowState {
    generation: Generation,
    phase: WindowPhase,
    anchor: Option<Anchor>,
    window: Window,
    at_end: bool,
    last_error: Option<WindowError>,
}

impl WindowState {
    fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            generation: self.generation,
            phase: self.phase,
            anchor: self.anchor.clone(),
            at_end: self.at_end,
            window: self.window.clone(),
        }
    }
}

/// How a successful response lands in the window.
#[derive(Debug, Clone, Copy)]
enum Apply {
    /// Drop whatever is loaded and take the response as the new window.
    Replace { at_end: bool },
    /// Merge the response into the loaded records.
    Extend,
}

/// Owner of one open log window. Cheap to clone; clones share the window.
#[derive(Clone)]
pub struct WindowManager {
    inner: Arc<Inner>,
}

struct Inner {
    coordinator: FetchCoordinator,
    observer: Arc<dyn WindowObserver>,
    state: Mutex<WindowState>,
}

impl WindowManager {
    pub fn new(coordinator: FetchCoordinator, observer: Arc<dyn WindowObserver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                coordinator,
                observer,
                state: Mutex::new(WindowState {
                    generation: 0,
                    phase: WindowPhase::Empty,
                    anchor: None,
                    window: Window::new(),
                    at_end: false,
                    last_error: None,
                }),
            }),
        }
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.lock().snapshot()
    }

    pub fn generation(&self) -> Generation {
        self.lock().generation
    }

    pub fn phase(&self) -> WindowPhase {
        self.lock().phase
    }

    pub fn is_at_end(&self) -> bool {
        self.lock().at_end
    }

    pub fn last_error(&self) -> Option<WindowError> {
        self.lock().last_error.clone()
    }

    /// Re-anchor the window and load both sides of `anchor`.
    ///
    /// Switching to another stream empties the window at once and publishes
    /// the empty snapshot. Re-seeking within the same stream keeps the old
    /// records visible until the new ones arrive, so a failed reload still
    /// shows the last good window.
    pub async fn reset(&self, anchor: Anchor) -> Result<LoadOutcome> {
        let (generation, previous, cleared) = {
            let mut state = self.lock();
            state.generation += 1;
            let same_stream = state
                .anchor
                .as_ref()
                .is_some_and(|current| current.stream == anchor.stream);
            let cleared = !same_stream && !state.window.is_empty();
            if cleared {
                state.window.clear();
            }
            state.anchor = Some(anchor.clone());
            state.at_end = false;
            let previous = std::mem::replace(&mut state.phase, WindowPhase::Loading);
            let cleared = cleared.then(|| Arc::new(state.snapshot()));
            (state.generation, previous, cleared)
        };
        info!(generation, stream = %anchor.stream, tail = anchor.is_tail(), "resetting log window");
        self.inner.observer.on_loading_state_changed(true);
        if let Some(snapshot) = cleared {
            self.inner.observer.on_window_changed(snapshot, generation);
        }

        let mut guard = LoadingGuard::new(self, generation, previous);
        let result = self
            .inner
            .coordinator
            .fetch_initial(&anchor)
            .await
            .map(|initial| {
                let mut records = initial.backward;
                records.extend(initial.forward);
                records
            });
        guard.disarm();
        self.apply(
            generation,
            Apply::Replace {
                at_end: anchor.is_tail(),
            },
            result,
        )
    }

    /// Page the window at `edge`. A no-op while another load is in flight.
    pub async fn load_more(&self, edge: Edge, size: usize) -> Result<LoadOutcome> {
        let (generation, previous, anchor, edge_key) = {
            let mut state = self.lock();
            if state.phase == WindowPhase::Loading {
                debug!(?edge, "load already in flight; skipping");
                return Ok(LoadOutcome::Busy);
            }
            let Some(anchor) = state.anchor.clone() else {
                return Ok(LoadOutcome::Detached);
            };
            let edge_record = match edge {
                Edge::Top => state.window.top(),
                Edge::Bottom => state.window.bottom(),
            };
            let edge_key = edge_record.map(LogRecord::key);
            let previous = std::mem::replace(&mut state.phase, WindowPhase::Loading);
            (state.generation, previous, anchor, edge_key)
        };
        debug!(generation, ?edge, size, "loading more records");
        self.inner.observer.on_loading_state_changed(true);

        let mut guard = LoadingGuard::new(self, generation, previous);
        let coordinator = &self.inner.coordinator;
        let result = match edge_key {
            Some(key) => coordinator.fetch_more(&anchor.stream, key, edge, size).await,
            None => coordinator.fetch_more_from_anchor(&anchor, edge, size).await,
        };
        guard.disarm();
        self.apply(generation, Apply::Extend, result)
    }

    /// Replace the window with the first or last page of the stream.
    pub async fn goto_boundary(&self, which: Boundary) -> Result<LoadOutcome> {
        let (generation, previous, stream) = {
            let mut state = self.lock();
            let Some(stream) = state.anchor.as_ref().map(|anchor| anchor.stream.clone()) else {
                return Ok(LoadOutcome::Detached);
            };
            state.generation += 1;
            state.at_end = false;
            let previous = std::mem::replace(&mut state.phase, WindowPhase::Loading);
            (state.generation, previous, stream)
        };
        info!(generation, stream = %stream, ?which, "jumping to stream boundary");
        self.inner.observer.on_loading_state_changed(true);

        let mut guard = LoadingGuard::new(self, generation, previous);
        let result = self.inner.coordinator.fetch_boundary(&stream, which).await;
        guard.disarm();
        self.apply(
            generation,
            Apply::Replace {
                at_end: which == Boundary::End,
            },
            result,
        )
    }

    /// Drop the window. Any fetch still in flight becomes stale.
    pub fn detach(&self) {
        let (snapshot, generation) = {
            let mut state = self.lock();
            state.generation += 1;
            state.window.clear();
            state.anchor = None;
            state.at_end = false;
            state.phase = WindowPhase::Empty;
            state.last_error = None;
            (Arc::new(state.snapshot()), state.generation)
        };
        debug!(generation, "log window detached");
        self.inner.observer.on_loading_state_changed(false);
        self.inner.observer.on_window_changed(snapshot, generation);
    }

    /// Detach because the selection no longer names one stream, and tell the
    /// consumer why the view is empty.
    pub fn reject_selection(&self, error: SelectionError) {
        info!("selection rejected: {error}");
        self.detach();
        let error = WindowError::from(error);
        self.lock().last_error = Some(error.clone());
        self.inner.observer.on_error(&error);
    }

    fn apply(
        &self,
        generation: Generation,
        mode: Apply,
        result: std::result::Result<Vec<LogRecord>, BackendError>,
    ) -> Result<LoadOutcome> {
        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                generation,
                current = state.generation,
                "discarding stale response"
            );
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(records) => {
                if let Apply::Replace { at_end } = mode {
                    state.window.clear();
                    state.at_end = at_end;
                }
                let added = state.window.merge(records);
                state.phase = WindowPhase::Ready;
                state.last_error = None;
                let snapshot = Arc::new(state.snapshot());
                drop(state);

                debug!(generation, added, total = snapshot.window.len(), "window updated");
                self.inner.observer.on_loading_state_changed(false);
                self.inner.observer.on_window_changed(snapshot, generation);
                Ok(LoadOutcome::Applied { added })
            }
            Err(err) => {
                let err = WindowError::from(err);
                state.phase = WindowPhase::Error;
                state.last_error = Some(err.clone());
                drop(state);

                warn!(generation, "log window fetch failed: {err}");
                self.inner.observer.on_loading_state_changed(false);
                self.inner.observer.on_error(&err);
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Puts the phase back if a load's future is dropped before its response
/// is applied, so an abandoned fetch never leaves the window `Loading`.
struct LoadingGuard<'a> {
    manager: &'a WindowManager,
    generation: Generation,
    previous: WindowPhase,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(manager: &'a WindowManager, generation: Generation, previous: WindowPhase) -> Self {
        Self {
            manager,
            generation,
            previous,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let restored = {
            let mut state = self.manager.lock();
            if state.generation != self.generation || state.phase != WindowPhase::Loading {
                return;
            }
            state.phase = match self.previous {
                WindowPhase::Error => WindowPhase::Error,
                _ if state.window.is_empty() => WindowPhase::Empty,
                _ => WindowPhase::Ready,
            };
            state.phase
        };
        debug!(
            generation = self.generation,
            ?restored,
            "load abandoned before its response arrived"
        );
        self.manager.inner.observer.on_loading_state_changed(false);
    }
}
