//! Effective movement windows.
//!
//! A window does not count movements itself. Recording a movement raises a
//! flag, and the window drains that flag into the effective count on a slower
//! cadence than the countdown, at most once over its lifetime. When the budget
//! runs out the flags are cleared for the next window.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::counter::Core;
use crate::session::WindowTick;

/// Open a fresh window and spawn its drain task. Must run inside the tokio
/// runtime (it is called from the session timer task).
pub(crate) fn open(core: &Arc<Core>, token: &CancelToken) {
    let opening = core.state.with_window(|w| {
        if token.is_cancelled() {
            None
        } else {
            Some(w.open())
        }
    });
    let Some(opening) = opening else {
        return;
    };

    if opening.superseded {
        warn!(
            generation = opening.generation,
            "effective window opened while the previous one was still active"
        );
    }
    info!(generation = opening.generation, "effective window opened");

    tokio::spawn(run_window(
        Arc::clone(core),
        token.clone(),
        opening.generation,
    ));
}

async fn run_window(core: Arc<Core>, token: CancelToken, generation: u64) {
    let interval = core.cadence.drain_interval();

    for _ in 0..core.cadence.window_ticks() {
        let tick = core.state.with_window(|w| {
            if token.is_cancelled() {
                None
            } else {
                Some(w.tick(generation))
            }
        });
        match tick {
            None => return,
            Some(WindowTick::Stale) => {
                debug!(generation, "effective window superseded");
                return;
            }
            Some(WindowTick::Counted(effective)) => {
                info!(generation, effective, "effective movement counted");
                core.notify_counts(core.state.counts());
            }
            Some(WindowTick::Idle) => {}
        }

        tokio::select! {
            _ = token.cancelled() => {
                debug!(generation, "effective window cancelled");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    let closed = core
        .state
        .with_window(|w| !token.is_cancelled() && w.close(generation));
    if closed {
        info!(generation, "effective window elapsed");
    }
}
