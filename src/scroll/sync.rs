use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration as ChronoDuration, Utc};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::ScrollState;
use crate::timeline::TimelineMapper;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_debug;

struct SyncState {
    scroll: ScrollState,
    /// Notifications the mediator expects to see echoed back from a pane it
    /// just wrote to; each programmatic copy swallows exactly one.
    pending_header_echoes: u32,
    pending_body_echoes: u32,
}

/// Keeps the fixed time-ruler pane and the scrollable body pane at the same
/// horizontal offset.
///
/// The two panes are independent scrollable regions that both report offset
/// changes here. Copying one pane's offset to the other tags the write with a
/// pending-echo count so the resulting notification from the target pane is
/// not re-interpreted as new user input. A low-frequency reconciler task
/// forces equality whenever the offsets drift past the configured tolerance,
/// catching events missed during very fast scroll gestures.
#[derive(Clone)]
pub struct ScrollSync {
    mapper: TimelineMapper,
    state: Arc<Mutex<SyncState>>,
    cancel: CancellationToken,
    reconciler: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ScrollSync {
    pub fn new(mapper: TimelineMapper) -> Self {
        Self {
            mapper,
            state: Arc::new(Mutex::new(SyncState {
                scroll: ScrollState::default(),
                pending_header_echoes: 0,
                pending_body_echoes: 0,
            })),
            cancel: CancellationToken::new(),
            reconciler: Arc::new(Mutex::new(None)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The header pane reported a new offset.
    pub fn on_header_scroll(&self, offset: f64) {
        let mut state = self.lock();
        state.scroll.header_offset = offset;
        if state.pending_header_echoes > 0 {
            // Echo of our own write; swallow it.
            state.pending_header_echoes -= 1;
            return;
        }
        state.scroll.last_user_interaction_at = Some(Utc::now());
        state.scroll.body_offset = offset;
        state.pending_body_echoes += 1;
    }

    /// The body pane reported a new offset.
    pub fn on_body_scroll(&self, offset: f64) {
        let mut state = self.lock();
        state.scroll.body_offset = offset;
        if state.pending_body_echoes > 0 {
            state.pending_body_echoes -= 1;
            return;
        }
        state.scroll.last_user_interaction_at = Some(Utc::now());
        state.scroll.header_offset = offset;
        state.pending_header_echoes += 1;
    }

    /// Jump both panes to a percent position on the strip, minus the left
    /// margin so the target is not flush against the pane edge. Programmatic:
    /// never stamps user interaction. Returns the applied pixel offset.
    pub fn scroll_to_percent(&self, percent: f64) -> f64 {
        let px = (self.mapper.px_of_percent(percent) - self.mapper.config().jump_margin_px)
            .max(0.0);
        let mut state = self.lock();
        state.scroll.header_offset = px;
        state.scroll.body_offset = px;
        state.pending_header_echoes += 1;
        state.pending_body_echoes += 1;
        px
    }

    /// Automatic re-centering; suppressed while the user is actively
    /// browsing, so the view is never yanked out from under them.
    pub fn maybe_recenter(&self, percent: f64) -> Option<f64> {
        if self.user_is_interacting() {
            log_debug!("recenter suppressed: user scrolled recently");
            return None;
        }
        Some(self.scroll_to_percent(percent))
    }

    /// True within the cooldown window after a non-programmatic scroll.
    pub fn user_is_interacting(&self) -> bool {
        let cooldown = ChronoDuration::seconds(self.mapper.config().user_cooldown_secs as i64);
        let state = self.lock();
        match state.scroll.last_user_interaction_at {
            Some(at) => Utc::now() - at < cooldown,
            None => false,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.lock().scroll.clone()
    }

    /// Start the reconciliation pass. Safety net against missed pane events:
    /// whenever the offsets drift past the tolerance the body pane wins, it
    /// being the pane users actually scroll.
    pub fn spawn_reconciler(&self) {
        let mut guard = match self.reconciler.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let cancel = self.cancel.clone();
        let tolerance = self.mapper.config().drift_tolerance_px;
        let tick = Duration::from_millis(self.mapper.config().reconcile_interval_ms);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut guard = match state.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        if guard.scroll.drift() > tolerance {
                            log_debug!(
                                "reconciling pane drift {:.1}px",
                                guard.scroll.drift()
                            );
                            guard.scroll.header_offset = guard.scroll.body_offset;
                            guard.pending_header_echoes += 1;
                        } else {
                            // Panes agree; expire echo credits for pane
                            // events that never arrived.
                            guard.pending_header_echoes = 0;
                            guard.pending_body_echoes = 0;
                        }
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        });

        *guard = Some(handle);
    }

    /// Deterministic teardown of the reconciler task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        let mut guard = match self.reconciler.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn force_offsets(&self, header: f64, body: f64) {
        let mut state = self.lock();
        state.scroll.header_offset = header;
        state.scroll.body_offset = body;
    }
}
