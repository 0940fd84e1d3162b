//! The public counting core.
//!
//! [`KickCounter`] is driven synchronously from the UI thread. It owns the shared
//! state and spawns the session timer (which in turn spawns effective windows)
//! on a tokio runtime.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;

use crate::config::Cadence;
use crate::observer::SessionObserver;
use crate::session::{Counts, SharedState, Snapshot};
use crate::{recorder, timer};

/// Everything a timer task needs, shared behind one `Arc`.
pub(crate) struct Core {
    pub(crate) state: SharedState,
    pub(crate) cadence: Cadence,
    pub(crate) observer: Arc<dyn SessionObserver>,
    pub(crate) handle: Handle,
}

impl Core {
    pub(crate) fn notify_counts(&self, counts: Counts) {
        self.observer
            .on_counts_changed(counts.actual, counts.effective);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Recorded { started_session: bool },
    /// Dropped by the input debounce gate.
    Ignored,
}

#[derive(Clone)]
pub struct KickCounter {
    core: Arc<Core>,
}

impl KickCounter {
    pub fn new(cadence: Cadence, observer: Arc<dyn SessionObserver>, handle: Handle) -> Self {
        Self {
            core: Arc::new(Core {
                state: SharedState::new(cadence.session_secs()),
                cadence,
                observer,
                handle,
            }),
        }
    }

    pub fn cadence(&self) -> Cadence {
        self.core.cadence
    }

    /// Record one movement, starting a session first if none is running.
    pub fn record_movement(&self) -> ActionResult {
        recorder::record(&self.core)
    }

    /// Start the countdown without recording a movement. Returns false if a
    /// session is already running.
    pub fn start_session(&self) -> bool {
        match timer::start_if_idle(&self.core, false) {
            Some(_) => {
                self.core.notify_counts(Counts::default());
                true
            }
            None => false,
        }
    }

    /// Stop both timers and put every counter back to its default.
    ///
    /// Fire-and-forget: the tasks observe the cancel token on their own and
    /// are not joined. Safe to call at any time, any number of times.
    pub fn cancel(&self) {
        let core = &self.core;
        let session_secs = core.cadence.session_secs();

        let was_running = core.state.with_session(|s| s.cancel(session_secs));
        core.state.with_window(|w| w.reset());
        let gate_was_closed = core.state.with_gate(|g| g.reset());

        if was_running {
            info!("session cancelled");
        }
        core.notify_counts(Counts::default());
        if gate_was_closed {
            core.observer.on_input_gate_changed(true);
        }
    }

    pub fn counts(&self) -> Counts {
        self.core.state.counts()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.core.state.snapshot()
    }
}

impl std::fmt::Debug for KickCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KickCounter")
            .field("cadence", &self.core.cadence)
            .field("state", &self.core.state)
            .finish()
    }
}
