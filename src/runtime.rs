use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner: terminal input plus the
/// notifications the counting core pushes out.
#[derive(Clone, Debug, PartialEq)]
pub enum KickEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Countdown(String),
    Counts { actual: u32, effective: u32 },
    Finished,
    InputGate(bool),
}

/// Source of events for the UI thread
pub trait KickEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<KickEvent, RecvTimeoutError>;
}

/// Production event source: crossterm input read on its own thread, merged
/// with anything sent through `sender()`.
pub struct CrosstermEventSource {
    tx: Sender<KickEvent>,
    rx: Receiver<KickEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        let input_tx = tx.clone();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if input_tx.send(KickEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if input_tx.send(KickEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<KickEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl KickEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<KickEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<KickEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<KickEvent>) -> Self {
        Self { rx }
    }
}

impl KickEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<KickEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: KickEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: KickEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> KickEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => KickEvent::Tick,
        }
    }
}
