use chrono::FixedOffset;

/// Display timezone offset in hours east of UTC. All stored instants are UTC;
/// this single fixed offset drives every local-date/hour derivation.
pub const DISPLAY_TZ_HOURS: i32 = 9;

/// Configuration for the timeline engine with tunable thresholds.
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Fixed local timezone used for all day-scoped calculations.
    pub display_tz: FixedOffset,

    /// Drag drop positions snap to this grid to avoid pointer jitter.
    pub snap_minutes: u32,

    /// Floor for rendered interval width so short in-progress sessions stay visible.
    pub min_visible_percent: f64,

    /// Full width of the 24-hour strip in pixels (header and body share it).
    pub strip_width_px: f64,

    /// Left margin applied when jumping to a position, so the target is not
    /// flush against the pane edge.
    pub jump_margin_px: f64,

    /// Pane offsets closer than this are considered synchronized.
    pub drift_tolerance_px: f64,

    /// How long after a user scroll the view refuses to auto-recenter.
    pub user_cooldown_secs: u64,

    /// Reconciliation pass interval (roughly 60 Hz).
    pub reconcile_interval_ms: u64,

    /// Now-marker refresh cadence while an open session is on screen.
    pub clock_fast_secs: u64,

    /// Now-marker refresh cadence otherwise.
    pub clock_slow_secs: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            display_tz: FixedOffset::east_opt(DISPLAY_TZ_HOURS * 3600)
                .expect("display offset is a valid fixed offset"),
            snap_minutes: 15,
            min_visible_percent: 0.4,
            strip_width_px: 1440.0,
            jump_margin_px: 40.0,
            drift_tolerance_px: 1.0,
            user_cooldown_secs: 10,
            reconcile_interval_ms: 16,
            clock_fast_secs: 5,
            clock_slow_secs: 30,
        }
    }
}
