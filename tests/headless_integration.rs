use std::sync::{mpsc, Arc};
use std::time::Duration;

use assert_matches::assert_matches;
use tokio::time::sleep;

use kicks::config::Cadence;
use kicks::observer::ChannelObserver;
use kicks::runtime::KickEvent;
use kicks::session::{Counts, SessionPhase};
use kicks::timer::FINISHED_TEXT;
use kicks::{ActionResult, KickCounter};

// Headless runs of the counting core on tokio's paused clock: a simulated hour
// takes milliseconds and every tick lands exactly on its deadline.

fn counter() -> (KickCounter, mpsc::Receiver<KickEvent>) {
    let (tx, rx) = mpsc::channel();
    let counter = KickCounter::new(
        Cadence::default(),
        Arc::new(ChannelObserver::new(tx)),
        tokio::runtime::Handle::current(),
    );
    (counter, rx)
}

fn countdowns(rx: &mpsc::Receiver<KickEvent>) -> Vec<String> {
    rx.try_iter()
        .filter_map(|ev| match ev {
            KickEvent::Countdown(text) => Some(text),
            _ => None,
        })
        .collect()
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[tokio::test(start_paused = true)]
async fn movements_in_two_windows_count_twice() {
    let (counter, _rx) = counter();

    assert_matches!(
        counter.record_movement(),
        ActionResult::Recorded {
            started_session: true
        }
    );
    sleep(secs(10)).await;
    assert_matches!(
        counter.record_movement(),
        ActionResult::Recorded {
            started_session: false
        }
    );
    sleep(secs(291)).await; // t = 301, second window
    counter.record_movement();
    sleep(secs(1)).await; // t = 302
    counter.record_movement();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(
        counter.counts(),
        Counts {
            actual: 4,
            effective: 2
        }
    );
}

#[tokio::test(start_paused = true)]
async fn spaced_movements_are_all_counted() {
    let (counter, _rx) = counter();
    counter.start_session();

    for _ in 0..25 {
        assert_matches!(counter.record_movement(), ActionResult::Recorded { .. });
        sleep(Duration::from_millis(1000)).await;
    }

    assert_eq!(counter.counts().actual, 25);
}

#[tokio::test(start_paused = true)]
async fn rapid_presses_count_once() {
    let (counter, rx) = counter();
    counter.start_session();
    sleep(secs(1)).await;

    assert_matches!(counter.record_movement(), ActionResult::Recorded { .. });
    for _ in 0..5 {
        sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.record_movement(), ActionResult::Ignored);
    }
    assert_eq!(counter.counts().actual, 1);
    assert!(!counter.snapshot().gate_open);

    sleep(secs(1)).await;
    assert!(counter.snapshot().gate_open);
    let gate_events: Vec<bool> = rx
        .try_iter()
        .filter_map(|ev| match ev {
            KickEvent::InputGate(open) => Some(open),
            _ => None,
        })
        .collect();
    assert_eq!(gate_events, vec![false, true]);
}

#[tokio::test(start_paused = true)]
async fn one_window_adds_at_most_one_effective_movement() {
    let (counter, _rx) = counter();
    counter.start_session();

    for _ in 0..40 {
        sleep(secs(7)).await;
        counter.record_movement();
    }
    // t = 280, still inside the first window
    assert_eq!(
        counter.counts(),
        Counts {
            actual: 40,
            effective: 1
        }
    );
}

#[tokio::test(start_paused = true)]
async fn countdown_ticks_every_second() {
    let (counter, rx) = counter();
    counter.start_session();
    sleep(Duration::from_millis(3500)).await;

    assert_eq!(countdowns(&rx), vec!["60:00", "59:59", "59:58", "59:57"]);
    assert_eq!(counter.snapshot().remaining_secs, 3597);
}

#[tokio::test(start_paused = true)]
async fn quiet_session_runs_to_completion() {
    let (counter, rx) = counter();
    assert!(counter.start_session());
    assert!(!counter.start_session(), "already running");

    sleep(secs(3601)).await;

    let events: Vec<KickEvent> = rx.try_iter().collect();
    let ticks: Vec<&String> = events
        .iter()
        .filter_map(|ev| match ev {
            KickEvent::Countdown(text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(ticks.len(), 3601);
    assert_eq!(ticks.first().map(|s| s.as_str()), Some("60:00"));
    assert_eq!(ticks[3599].as_str(), "00:01");
    assert_eq!(ticks.last().map(|s| s.as_str()), Some(FINISHED_TEXT));
    assert_eq!(events.last(), Some(&KickEvent::Finished));

    let snapshot = counter.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Completed);
    assert!(!snapshot.running);
    assert_eq!(snapshot.remaining_secs, 0);
    assert_eq!(snapshot.counts(), Counts::default());
}

#[tokio::test(start_paused = true)]
async fn every_window_can_contribute_once() {
    let (counter, _rx) = counter();
    counter.start_session();

    for _ in 0..12 {
        sleep(secs(150)).await;
        counter.record_movement();
        sleep(secs(150)).await;
    }
    sleep(secs(1)).await;

    let snapshot = counter.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Completed);
    assert_eq!(
        snapshot.counts(),
        Counts {
            actual: 12,
            effective: 12
        }
    );
    assert!(!snapshot.window_active);
}

#[tokio::test(start_paused = true)]
async fn restart_after_completion_starts_from_zero() {
    let (counter, _rx) = counter();
    counter.record_movement();
    sleep(secs(3601)).await;
    assert_eq!(counter.counts().actual, 1);

    assert_matches!(
        counter.record_movement(),
        ActionResult::Recorded {
            started_session: true
        }
    );
    sleep(Duration::from_millis(10)).await;
    assert_eq!(
        counter.counts(),
        Counts {
            actual: 1,
            effective: 1
        }
    );
    assert!(counter.snapshot().running);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_both_timers_and_resets() {
    let (counter, rx) = counter();
    counter.record_movement();
    sleep(Duration::from_millis(2500)).await;
    counter.record_movement();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(counter.counts().actual, 2);

    counter.cancel();
    let _ = rx.try_iter().count();

    sleep(secs(600)).await;
    assert!(countdowns(&rx).is_empty(), "no ticks after cancel");

    let snapshot = counter.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Cancelled);
    assert!(!snapshot.running);
    assert_eq!(snapshot.remaining_secs, 3600);
    assert_eq!(snapshot.counts(), Counts::default());
    assert!(!snapshot.window_active);
    assert!(snapshot.gate_open);
}

#[tokio::test(start_paused = true)]
async fn cancel_while_idle_is_harmless() {
    let (counter, rx) = counter();
    counter.cancel();

    let snapshot = counter.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(snapshot.remaining_secs, 3600);
    assert_eq!(snapshot.counts(), Counts::default());
    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![KickEvent::Counts {
            actual: 0,
            effective: 0
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_twice_matches_cancel_once() {
    let (counter, _rx) = counter();
    counter.record_movement();
    sleep(secs(4)).await;

    counter.cancel();
    let once = counter.snapshot();
    counter.cancel();
    let twice = counter.snapshot();

    assert_eq!(once, twice);
}

#[tokio::test(start_paused = true)]
async fn new_session_after_cancel_counts_cleanly() {
    let (counter, _rx) = counter();
    counter.record_movement();
    sleep(secs(2)).await;
    counter.cancel();

    counter.record_movement();
    sleep(secs(2)).await;
    counter.record_movement();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(
        counter.counts(),
        Counts {
            actual: 2,
            effective: 1
        }
    );
    assert_eq!(counter.snapshot().remaining_secs, 3598);
}

#[tokio::test(start_paused = true)]
async fn short_cadence_from_config() {
    let cadence = Cadence::new(60, 20, 2, Duration::from_millis(500)).unwrap();
    let (tx, rx) = mpsc::channel();
    let counter = KickCounter::new(
        cadence,
        Arc::new(ChannelObserver::new(tx)),
        tokio::runtime::Handle::current(),
    );

    counter.record_movement();
    sleep(Duration::from_millis(500)).await;
    counter.record_movement();
    sleep(secs(25)).await; // second window
    counter.record_movement();
    sleep(secs(40)).await;

    let snapshot = counter.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Completed);
    assert_eq!(
        snapshot.counts(),
        Counts {
            actual: 3,
            effective: 2
        }
    );
    assert_eq!(countdowns(&rx).first().map(|s| s.as_str()), Some("01:00"));
}
