use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::counter::{ActionResult, Core};
use crate::session::Counts;
use crate::timer;

pub(crate) fn record(core: &Arc<Core>) -> ActionResult {
    let hold = core.cadence.input_debounce();
    let Some(epoch) = core.state.with_gate(|g| g.try_close(Instant::now(), hold)) else {
        debug!("movement dropped by input debounce");
        return ActionResult::Ignored;
    };
    core.observer.on_input_gate_changed(false);
    spawn_reopen(core, epoch);

    let (token, actual, started_session) = match timer::start_if_idle(core, true) {
        Some((token, actual)) => (token, actual, true),
        None => {
            let current = core.state.with_session(|s| {
                let token = s.token().cloned()?;
                s.actual_count += 1;
                Some((token, s.actual_count))
            });
            match current {
                Some((token, actual)) => (token, actual, false),
                // The session ended between the two locks; start over.
                None => match timer::start_if_idle(core, true) {
                    Some((token, actual)) => (token, actual, true),
                    None => return ActionResult::Ignored,
                },
            }
        }
    };

    let effective = core.state.with_window(|w| {
        if token.is_cancelled() {
            return None;
        }
        w.mark_movement();
        if let Some(effective) = w.drain() {
            info!(effective, "effective movement counted");
        }
        Some(w.effective_count)
    });
    let Some(effective) = effective else {
        // Cancelled mid-record; the cancel has already published zeroes.
        return ActionResult::Ignored;
    };

    info!(actual, effective, "movement recorded");
    core.notify_counts(Counts { actual, effective });
    ActionResult::Recorded { started_session }
}

fn spawn_reopen(core: &Arc<Core>, epoch: u64) {
    let hold = core.cadence.input_debounce();
    let handle = core.handle.clone();
    let core = Arc::clone(core);
    handle.spawn(async move {
        tokio::time::sleep(hold).await;
        if core.state.with_gate(|g| g.reopen(epoch)) {
            core.observer.on_input_gate_changed(true);
        }
    });
}
