use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::cancel::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionPhase {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Countdown and raw movement count for the current session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub remaining_secs: u32,
    pub actual_count: u32,
    cancel: Option<CancelToken>,
}

impl SessionState {
    pub fn new(session_secs: u32) -> Self {
        Self {
            phase: SessionPhase::Idle,
            remaining_secs: session_secs,
            actual_count: 0,
            cancel: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Enter `Running` with a full countdown and a fresh cancel token.
    pub(crate) fn begin(&mut self, session_secs: u32) -> CancelToken {
        let token = CancelToken::new();
        self.phase = SessionPhase::Running;
        self.remaining_secs = session_secs;
        self.actual_count = 0;
        self.cancel = Some(token.clone());
        token
    }

    pub(crate) fn token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    pub(crate) fn finish(&mut self) {
        self.phase = SessionPhase::Completed;
        self.remaining_secs = 0;
        self.cancel = None;
    }

    /// Signal the running session (if any) and restore the defaults.
    pub(crate) fn cancel(&mut self, session_secs: u32) -> bool {
        let was_running = self.is_running();
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if was_running {
            self.phase = SessionPhase::Cancelled;
        }
        self.remaining_secs = session_secs;
        self.actual_count = 0;
        was_running
    }
}

/// Result of one drain attempt by an effective window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTick {
    /// A pending movement was turned into an effective count.
    Counted(u32),
    Idle,
    /// A newer window owns the state now.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOpening {
    pub generation: u64,
    pub superseded: bool,
}

/// The level-triggered movement flag and the effective counter it drains into.
///
/// `has_movement` is raised by every recorded movement; `already_counted`
/// latches the first drain inside the active window so the effective count
/// moves at most once per window.
#[derive(Debug, Clone, Default)]
pub struct EffectiveWindowState {
    pub window_active: bool,
    pub already_counted: bool,
    pub has_movement: bool,
    pub effective_count: u32,
    generation: u64,
}

impl EffectiveWindowState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mark_movement(&mut self) {
        self.has_movement = true;
    }

    /// Apply a pending movement to the effective count. Returns the new count
    /// when it changed. Nothing happens without an active window; the raised
    /// flag then waits for the next one.
    pub fn drain(&mut self) -> Option<u32> {
        if self.window_active && self.has_movement && !self.already_counted {
            self.effective_count += 1;
            self.already_counted = true;
            Some(self.effective_count)
        } else {
            None
        }
    }

    pub fn open(&mut self) -> WindowOpening {
        let superseded = self.window_active;
        if superseded {
            // The previous window never reached its own close; its movement
            // flag belongs to it, not to the window starting now.
            self.has_movement = false;
        }
        self.already_counted = false;
        self.window_active = true;
        self.generation += 1;
        WindowOpening {
            generation: self.generation,
            superseded,
        }
    }

    pub fn tick(&mut self, generation: u64) -> WindowTick {
        if !self.window_active || generation != self.generation {
            return WindowTick::Stale;
        }
        match self.drain() {
            Some(effective) => WindowTick::Counted(effective),
            None => WindowTick::Idle,
        }
    }

    /// Close the window at the end of its tick budget. A superseded window
    /// leaves the state alone.
    pub fn close(&mut self, generation: u64) -> bool {
        if !self.window_active || generation != self.generation {
            return false;
        }
        self.window_active = false;
        self.has_movement = false;
        self.already_counted = false;
        true
    }

    /// Back to defaults. The generation keeps counting so that windows from
    /// the previous session recognise themselves as stale.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }
}

/// Button-level guard against one tap registering twice.
#[derive(Debug, Clone, Default)]
pub struct DebounceGate {
    closed_until: Option<Instant>,
    epoch: u64,
}

impl DebounceGate {
    pub fn is_open(&self, now: Instant) -> bool {
        self.closed_until.map_or(true, |until| now >= until)
    }

    /// Close the gate for `hold` if it is open. Returns the epoch the matching
    /// `reopen` must present, or `None` when the press should be dropped.
    pub fn try_close(&mut self, now: Instant, hold: Duration) -> Option<u64> {
        if !self.is_open(now) {
            return None;
        }
        self.closed_until = Some(now + hold);
        self.epoch += 1;
        Some(self.epoch)
    }

    pub fn reopen(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || self.closed_until.is_none() {
            return false;
        }
        self.closed_until = None;
        true
    }

    /// Returns true if the gate was closed.
    pub fn reset(&mut self) -> bool {
        let was_closed = self.closed_until.is_some();
        self.closed_until = None;
        self.epoch += 1;
        was_closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub actual: u32,
    pub effective: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: SessionPhase,
    pub running: bool,
    pub remaining_secs: u32,
    pub actual: u32,
    pub effective: u32,
    pub window_active: bool,
    pub gate_open: bool,
}

impl Snapshot {
    pub fn counts(&self) -> Counts {
        Counts {
            actual: self.actual,
            effective: self.effective,
        }
    }
}

/// All mutable state shared between the caller and the timer tasks.
///
/// Session and effective window sit behind separate locks; no accessor holds
/// both at once.
#[derive(Debug)]
pub struct SharedState {
    session: Mutex<SessionState>,
    window: Mutex<EffectiveWindowState>,
    gate: Mutex<DebounceGate>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SharedState {
    pub fn new(session_secs: u32) -> Self {
        Self {
            session: Mutex::new(SessionState::new(session_secs)),
            window: Mutex::new(EffectiveWindowState::default()),
            gate: Mutex::new(DebounceGate::default()),
        }
    }

    pub fn with_session<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut lock(&self.session))
    }

    pub fn with_window<R>(&self, f: impl FnOnce(&mut EffectiveWindowState) -> R) -> R {
        f(&mut lock(&self.window))
    }

    pub fn with_gate<R>(&self, f: impl FnOnce(&mut DebounceGate) -> R) -> R {
        f(&mut lock(&self.gate))
    }

    /// Reads each lock in turn; the pair may straddle a concurrent update.
    pub fn counts(&self) -> Counts {
        let actual = self.with_session(|s| s.actual_count);
        let effective = self.with_window(|w| w.effective_count);
        Counts { actual, effective }
    }

    pub fn snapshot(&self) -> Snapshot {
        let (phase, remaining_secs, actual) =
            self.with_session(|s| (s.phase, s.remaining_secs, s.actual_count));
        let (effective, window_active) =
            self.with_window(|w| (w.effective_count, w.window_active));
        let gate_open = self.with_gate(|g| g.is_open(Instant::now()));
        Snapshot {
            phase,
            running: phase == SessionPhase::Running,
            remaining_secs,
            actual,
            effective,
            window_active,
            gate_open,
        }
    }
}
