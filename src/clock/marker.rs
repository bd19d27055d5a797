use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;

use crate::timeline::TimelineMapper;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_debug;

struct MarkerState {
    anchor_day: NaiveDate,
    position_pct: Option<f64>,
}

/// The "now" marker on the strip.
///
/// Every tick re-derives the position from the current instant instead of
/// incrementing a cached value, so a host wall-clock jump in either direction
/// heals itself on the next tick. When the current instant's local date is
/// not the displayed anchor day the position is `None` and the host renders
/// nothing.
#[derive(Clone)]
pub struct NowMarker {
    mapper: TimelineMapper,
    state: Arc<Mutex<MarkerState>>,
    open_sessions: Arc<AtomicBool>,
    cancel: CancellationToken,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl NowMarker {
    pub fn new(mapper: TimelineMapper, anchor_day: NaiveDate) -> Self {
        let marker = Self {
            mapper,
            state: Arc::new(Mutex::new(MarkerState {
                anchor_day,
                position_pct: None,
            })),
            open_sessions: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            ticker: Arc::new(Mutex::new(None)),
        };
        marker.recompute_now();
        marker
    }

    fn lock(&self) -> MutexGuard<'_, MarkerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current marker position, percent of 24 hours; `None` when the current
    /// instant is outside the displayed day.
    pub fn position(&self) -> Option<f64> {
        self.lock().position_pct
    }

    pub fn anchor_day(&self) -> NaiveDate {
        self.lock().anchor_day
    }

    /// Switch the displayed day and recompute immediately.
    pub fn set_anchor_day(&self, day: NaiveDate) {
        self.lock().anchor_day = day;
        self.recompute_now();
    }

    /// Flip the refresh cadence: fast while at least one on-screen session is
    /// open, slow otherwise.
    pub fn set_open_sessions(&self, any_open: bool) {
        self.open_sessions.store(any_open, Ordering::Relaxed);
    }

    pub fn recompute_now(&self) {
        self.recompute_at(Utc::now());
    }

    fn recompute_at(&self, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.position_pct = self.mapper.position_of(now, state.anchor_day);
    }

    fn cadence(&self) -> Duration {
        let cfg = self.mapper.config();
        if self.open_sessions.load(Ordering::Relaxed) {
            Duration::from_secs(cfg.clock_fast_secs)
        } else {
            Duration::from_secs(cfg.clock_slow_secs)
        }
    }

    /// Start the periodic refresh. The sleep length is re-read every
    /// iteration so a cadence flip takes effect on the next tick.
    pub fn spawn_ticker(&self) {
        let mut guard = match self.ticker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let marker = self.clone();
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                let cadence = marker.cadence();
                tokio::select! {
                    _ = time::sleep(cadence) => {
                        marker.recompute_now();
                        log_debug!("now marker at {:?}", marker.position());
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        });

        *guard = Some(handle);
    }

    /// Deterministic teardown of the refresh task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        let mut guard = match self.ticker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use chrono::TimeZone;

    fn mapper() -> TimelineMapper {
        TimelineMapper::new(TimelineConfig::default())
    }

    #[test]
    fn marker_tracks_an_instant_inside_the_anchor_day() {
        let m = mapper();
        // 03:00 UTC is 12:00 local (+09:00) on the same date.
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 3, 0, 0).unwrap();
        let anchor = m.local_date(now);

        let marker = NowMarker::new(m, anchor);
        marker.recompute_at(now);
        let pct = marker.position().unwrap();
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn viewing_another_day_renders_no_marker() {
        let m = mapper();
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 3, 0, 0).unwrap();
        // Anchor on the following day; the marker must disappear.
        let anchor = m.local_date(now).succ_opt().unwrap();

        let marker = NowMarker::new(m, anchor);
        marker.recompute_at(now);
        assert_eq!(marker.position(), None);
    }

    #[test]
    fn backward_clock_jump_rederives_rather_than_accumulates() {
        let m = mapper();
        let before = Utc.with_ymd_and_hms(2024, 5, 20, 6, 0, 0).unwrap();
        let anchor = m.local_date(before);
        let marker = NowMarker::new(m, anchor);

        marker.recompute_at(before);
        let at_before = marker.position().unwrap();

        // Host clock corrected two hours backward; next tick must follow it.
        let corrected = Utc.with_ymd_and_hms(2024, 5, 20, 4, 0, 0).unwrap();
        marker.recompute_at(corrected);
        let at_corrected = marker.position().unwrap();
        assert!(at_corrected < at_before);
    }

    #[test]
    fn cadence_follows_the_open_session_flag() {
        let marker = NowMarker::new(mapper(), NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
        let cfg = TimelineConfig::default();

        assert_eq!(marker.cadence(), Duration::from_secs(cfg.clock_slow_secs));
        marker.set_open_sessions(true);
        assert_eq!(marker.cadence(), Duration::from_secs(cfg.clock_fast_secs));
        marker.set_open_sessions(false);
        assert_eq!(marker.cadence(), Duration::from_secs(cfg.clock_slow_secs));
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_refreshes_on_schedule_and_shuts_down() {
        let m = mapper();
        let marker = NowMarker::new(m.clone(), m.local_date(Utc::now()));
        marker.set_open_sessions(true);
        marker.spawn_ticker();

        // A fast-cadence tick lands within ~5s of paused time.
        tokio::time::advance(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        marker.shutdown();

        // After shutdown the day can change without the ticker resurrecting.
        marker.set_anchor_day(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(marker.position(), None);
    }
}
