use std::sync::mpsc::Sender;

use crate::runtime::KickEvent;

/// Outbound notifications from the counting core to whatever presents it.
///
/// Called from timer tasks as well as from the thread that records
/// movements, so implementations must not block.
pub trait SessionObserver: Send + Sync + 'static {
    /// Once per second while running, plus the terminal marker on completion.
    fn on_countdown_tick(&self, display: &str);

    fn on_counts_changed(&self, actual: u32, effective: u32);

    /// The countdown ran out; a restart is available.
    fn on_session_finished(&self) {}

    fn on_input_gate_changed(&self, _open: bool) {}
}

/// Forwards notifications into the UI event channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<KickEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<KickEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: KickEvent) {
        // A closed channel means the UI has gone away; nothing left to tell.
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn on_countdown_tick(&self, display: &str) {
        self.send(KickEvent::Countdown(display.to_string()));
    }

    fn on_counts_changed(&self, actual: u32, effective: u32) {
        self.send(KickEvent::Counts { actual, effective });
    }

    fn on_session_finished(&self) {
        self.send(KickEvent::Finished);
    }

    fn on_input_gate_changed(&self, open: bool) {
        self.send(KickEvent::InputGate(open));
    }
}
