use crate::counter::{ActionResult, KickCounter};
use crate::runtime::KickEvent;
use crate::timer::format_countdown;

/// Label of the primary control, which doubles as the session's visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum StartLabel {
    #[strum(serialize = "Start counting")]
    Start,
    #[strum(serialize = "Felt a kick!")]
    CountMovement,
    #[strum(serialize = "Start again")]
    StartAgain,
}

/// What the terminal shows, kept in step with the core through [`KickEvent`]s.
#[derive(Debug)]
pub struct App {
    pub counter: KickCounter,
    pub countdown: String,
    pub actual: u32,
    pub effective: u32,
    pub start_label: StartLabel,
    pub cancel_enabled: bool,
    pub record_enabled: bool,
    pub confirming_cancel: bool,
    pub confirm_cancel: bool,
}

impl App {
    pub fn new(counter: KickCounter, confirm_cancel: bool) -> Self {
        let countdown = format_countdown(counter.cadence().session_secs());
        Self {
            counter,
            countdown,
            actual: 0,
            effective: 0,
            start_label: StartLabel::Start,
            cancel_enabled: false,
            record_enabled: true,
            confirming_cancel: false,
            confirm_cancel,
        }
    }

    fn session_active(&self) -> bool {
        self.start_label == StartLabel::CountMovement
    }

    /// Fold a core notification into the display. Input events are ignored.
    ///
    /// Countdown and count updates that arrive after a cancel are stale and
    /// dropped, so they cannot undo the display reset.
    pub fn apply(&mut self, event: &KickEvent) {
        match event {
            KickEvent::Countdown(text) if self.session_active() => {
                self.countdown = text.clone();
            }
            KickEvent::Counts { actual, effective } if self.session_active() => {
                self.actual = *actual;
                self.effective = *effective;
            }
            KickEvent::Finished if self.session_active() => {
                self.start_label = StartLabel::StartAgain;
                self.cancel_enabled = false;
                self.record_enabled = true;
            }
            KickEvent::InputGate(open) => {
                self.record_enabled = *open;
            }
            _ => {}
        }
    }

    /// The primary control: starts a session, or records a movement while one runs.
    pub fn on_primary(&mut self) {
        match self.start_label {
            StartLabel::Start | StartLabel::StartAgain => {
                self.counter.start_session();
                self.begin_display();
            }
            StartLabel::CountMovement => {
                if let ActionResult::Recorded {
                    started_session: true,
                } = self.counter.record_movement()
                {
                    // The countdown ran out just before the press landed.
                    self.begin_display();
                    let counts = self.counter.counts();
                    self.actual = counts.actual;
                    self.effective = counts.effective;
                }
            }
        }
    }

    fn begin_display(&mut self) {
        self.start_label = StartLabel::CountMovement;
        self.cancel_enabled = true;
        self.countdown = format_countdown(self.counter.cadence().session_secs());
        self.actual = 0;
        self.effective = 0;
    }

    pub fn request_cancel(&mut self) {
        if !self.cancel_enabled {
            return;
        }
        if self.confirm_cancel {
            self.confirming_cancel = true;
        } else {
            self.answer_cancel(true);
        }
    }

    pub fn answer_cancel(&mut self, yes: bool) {
        self.confirming_cancel = false;
        if !yes {
            return;
        }
        self.counter.cancel();
        self.countdown = format_countdown(self.counter.cadence().session_secs());
        self.actual = 0;
        self.effective = 0;
        self.start_label = StartLabel::Start;
        self.cancel_enabled = false;
        self.record_enabled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cadence;
    use crate::observer::ChannelObserver;
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    fn make_app(confirm: bool) -> (App, mpsc::Receiver<KickEvent>) {
        let (tx, rx) = mpsc::channel();
        let counter = KickCounter::new(
            Cadence::default(),
            Arc::new(ChannelObserver::new(tx)),
            tokio::runtime::Handle::current(),
        );
        (App::new(counter, confirm), rx)
    }

    fn pump(app: &mut App, rx: &mpsc::Receiver<KickEvent>) {
        for ev in rx.try_iter() {
            app.apply(&ev);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn starts_with_full_countdown() {
        let (app, _rx) = make_app(true);
        assert_eq!(app.countdown, "60:00");
        assert_eq!(app.start_label, StartLabel::Start);
        assert!(!app.cancel_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn primary_starts_then_records() {
        let (mut app, rx) = make_app(true);
        app.on_primary();
        assert_eq!(app.start_label, StartLabel::CountMovement);
        assert!(app.cancel_enabled);
        assert!(app.counter.snapshot().running);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        app.on_primary();
        tokio::time::sleep(Duration::from_millis(10)).await;
        pump(&mut app, &rx);

        assert_eq!(app.actual, 1);
        assert_eq!(app.effective, 1);
        assert_eq!(app.countdown, "59:59");
        assert!(!app.record_enabled, "gate closed right after a press");

        tokio::time::sleep(Duration::from_secs(1)).await;
        pump(&mut app, &rx);
        assert!(app.record_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_waits_for_confirmation() {
        let (mut app, rx) = make_app(true);
        app.on_primary();
        app.on_primary();
        tokio::time::sleep(Duration::from_secs(5)).await;
        pump(&mut app, &rx);

        app.request_cancel();
        assert!(app.confirming_cancel);
        app.answer_cancel(false);
        assert!(!app.confirming_cancel);
        assert!(app.counter.snapshot().running);

        app.request_cancel();
        app.answer_cancel(true);
        assert!(!app.counter.snapshot().running);
        assert_eq!(app.countdown, "60:00");
        assert_eq!((app.actual, app.effective), (0, 0));
        assert_eq!(app.start_label, StartLabel::Start);

        // anything still queued from the cancelled session is stale
        tokio::time::sleep(Duration::from_secs(2)).await;
        pump(&mut app, &rx);
        assert_eq!(app.countdown, "60:00");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_unavailable_while_idle() {
        let (mut app, _rx) = make_app(true);
        app.request_cancel();
        assert!(!app.confirming_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn finishing_offers_restart() {
        let (mut app, rx) = make_app(false);
        app.on_primary();
        tokio::time::sleep(Duration::from_secs(3601)).await;
        pump(&mut app, &rx);

        assert_eq!(app.countdown, crate::timer::FINISHED_TEXT);
        assert_eq!(app.start_label, StartLabel::StartAgain);
        assert!(!app.cancel_enabled);

        app.on_primary();
        assert_eq!(app.start_label, StartLabel::CountMovement);
        assert_eq!(app.countdown, "60:00");
    }

    #[test]
    fn labels_read_naturally() {
        assert_eq!(StartLabel::Start.to_string(), "Start counting");
        assert_eq!(StartLabel::CountMovement.to_string(), "Felt a kick!");
        assert_eq!(StartLabel::StartAgain.to_string(), "Start again");
    }
}
