use std::sync::Arc;

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::counter::Core;
use crate::window;

/// Shown in place of the countdown once a session runs out.
pub const FINISHED_TEXT: &str = "Countdown finished!";

/// `MM:SS`, zero padded. Minutes are not wrapped into hours.
pub fn format_countdown(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Begin a session if none is running and spawn its timer task.
///
/// With `count_movement` the first movement is added under the same lock, so
/// the new session never shows a zero actual count. Returns the session's token
/// and its actual count.
pub(crate) fn start_if_idle(core: &Arc<Core>, count_movement: bool) -> Option<(CancelToken, u32)> {
    let session_secs = core.cadence.session_secs();
    let started = core.state.with_session(|s| {
        if s.is_running() {
            return None;
        }
        let token = s.begin(session_secs);
        if count_movement {
            s.actual_count += 1;
        }
        Some((token, s.actual_count))
    })?;

    core.state.with_window(|w| w.reset());
    info!(session_secs, "session started");
    core.handle
        .spawn(run_session(Arc::clone(core), started.0.clone()));
    Some(started)
}

async fn run_session(core: Arc<Core>, token: CancelToken) {
    let total = core.cadence.session_secs();
    let window_secs = core.cadence.window_secs();
    let tick = core.cadence.tick();

    for remaining in (1..=total).rev() {
        let live = core.state.with_session(|s| {
            if token.is_cancelled() {
                return false;
            }
            s.remaining_secs = remaining;
            true
        });
        if !live {
            return;
        }

        core.observer.on_countdown_tick(&format_countdown(remaining));

        if remaining % window_secs == 0 {
            window::open(&core, &token);
        }

        tokio::select! {
            _ = token.cancelled() => {
                debug!(remaining, "countdown cancelled");
                return;
            }
            _ = tokio::time::sleep(tick) => {}
        }
    }

    let completed = core.state.with_session(|s| {
        if token.is_cancelled() {
            return None;
        }
        s.finish();
        Some(s.actual_count)
    });
    if let Some(actual) = completed {
        let effective = core.state.with_window(|w| w.effective_count);
        info!(actual, effective, "session completed");
        core.observer.on_countdown_tick(FINISHED_TEXT);
        core.observer.on_session_finished();
    }
}
