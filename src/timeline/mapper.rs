use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

use crate::config::TimelineConfig;

const DAY_SECS: f64 = 86_400.0;
const DAY_MINUTES: i64 = 1_440;

/// Bidirectional mapping between absolute UTC instants and fractional
/// positions on a fixed-timezone 24-hour strip for one anchor day.
///
/// All percent math stays in f64 and is clamped to [0, 100] at every boundary
/// crossing so rendering code cannot draw off-strip.
#[derive(Debug, Clone)]
pub struct TimelineMapper {
    cfg: TimelineConfig,
}

impl TimelineMapper {
    pub fn new(cfg: TimelineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.cfg
    }

    /// Position of `instant` on the strip for `anchor_day`, as a percent of
    /// 24 hours. `None` when the instant's local date is not the anchor day;
    /// this is a day-scoped timeline, not a rolling window.
    pub fn position_of(&self, instant: DateTime<Utc>, anchor_day: NaiveDate) -> Option<f64> {
        let local = instant.with_timezone(&self.cfg.display_tz);
        if local.date_naive() != anchor_day {
            return None;
        }
        let secs = local.num_seconds_from_midnight() as f64;
        Some(clamp_pct(secs / DAY_SECS * 100.0))
    }

    /// Width of `[start, end]` as a percent of 24 hours, for rendering on the
    /// `anchor_day` strip. An open end (`None`) is substituted with `now`. An
    /// end that spills past the anchor day's local midnight is clamped there
    /// for display; the true end in the underlying data is untouched. The
    /// result is floored at the minimum visible width and capped at 100.
    pub fn duration_percent(
        &self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        anchor_day: NaiveDate,
        now: DateTime<Utc>,
    ) -> f64 {
        let mut end = end.unwrap_or(now);
        if let Some(midnight) = self.day_end_utc(anchor_day) {
            if end > midnight {
                end = midnight;
            }
        }
        let secs = (end - start).num_seconds().max(0) as f64;
        let pct = secs / DAY_SECS * 100.0;
        clamp_pct(pct.max(self.cfg.min_visible_percent))
    }

    /// Inverse mapping used by drag interactions: percent position back to an
    /// instant on the anchor day, snapped to the configured grid so pointer
    /// precision cannot produce sub-minute jitter. `None` when the anchor day
    /// cannot be resolved in the display timezone.
    pub fn instant_of(&self, percent: f64, anchor_day: NaiveDate) -> Option<DateTime<Utc>> {
        let percent = clamp_pct(percent);
        let snap = self.cfg.snap_minutes.max(1) as i64;
        let raw_minutes = percent / 100.0 * DAY_MINUTES as f64;
        let mut snapped = (raw_minutes / snap as f64).round() as i64 * snap;
        // Keep the result inside the anchor day; 100% would otherwise land on
        // the next day's midnight and fail the round trip.
        snapped = snapped.clamp(0, DAY_MINUTES - snap);
        let day_start = self.day_start_utc(anchor_day)?;
        Some(day_start + Duration::minutes(snapped))
    }

    /// Pixel offset into the strip for a percent position.
    pub fn px_of_percent(&self, percent: f64) -> f64 {
        clamp_pct(percent) / 100.0 * self.cfg.strip_width_px
    }

    /// Percent position for a pixel offset into the strip.
    pub fn percent_of_px(&self, px: f64) -> f64 {
        if self.cfg.strip_width_px <= 0.0 {
            return 0.0;
        }
        clamp_pct(px / self.cfg.strip_width_px * 100.0)
    }

    /// UTC instant of the anchor day's local midnight (start of day).
    pub fn day_start_utc(&self, anchor_day: NaiveDate) -> Option<DateTime<Utc>> {
        let local_midnight = anchor_day.and_hms_opt(0, 0, 0)?;
        self.cfg
            .display_tz
            .from_local_datetime(&local_midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// UTC instant of the anchor day's end (next local midnight).
    pub fn day_end_utc(&self, anchor_day: NaiveDate) -> Option<DateTime<Utc>> {
        self.day_start_utc(anchor_day.succ_opt()?)
    }

    /// Local calendar date of an instant in the display timezone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.cfg.display_tz).date_naive()
    }
}

fn clamp_pct(pct: f64) -> f64 {
    pct.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn mapper() -> TimelineMapper {
        TimelineMapper::new(TimelineConfig::default())
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Local 10:00 on the anchor day sits at 10/24 of the strip.
    #[test]
    fn position_of_mid_morning() {
        let m = mapper();
        let anchor = day(2024, 5, 20);
        // 10:00 local (+09:00) is 01:00 UTC.
        let instant = Utc.with_ymd_and_hms(2024, 5, 20, 1, 0, 0).unwrap();
        let pct = m.position_of(instant, anchor).unwrap();
        assert!((pct - (10.0 / 24.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn position_of_wrong_local_date_is_none() {
        let m = mapper();
        let anchor = day(2024, 5, 20);
        // 23:00 UTC on the 20th is 08:00 local on the 21st.
        let instant = Utc.with_ymd_and_hms(2024, 5, 20, 23, 0, 0).unwrap();
        assert_eq!(m.position_of(instant, anchor), None);
    }

    #[test]
    fn round_trip_within_one_snap_step() {
        let m = mapper();
        let anchor = day(2024, 5, 20);
        let snap_pct = 15.0 / 1440.0 * 100.0;
        for p in [0.0, 3.7, 25.0, 41.66, 73.2, 99.9, 100.0] {
            let instant = m.instant_of(p, anchor).unwrap();
            let back = m.position_of(instant, anchor).unwrap();
            assert!(
                (back - p).abs() <= snap_pct + 1e-9,
                "p={p} back={back} exceeds one snap step"
            );
        }
    }

    #[test]
    fn instant_of_snaps_to_quarter_hours() {
        let m = mapper();
        let anchor = day(2024, 5, 20);
        // 10:07 local is ~41.9%; should snap to 10:00 local = 01:00 UTC.
        let pct = (10.0 * 60.0 + 7.0) / 1440.0 * 100.0;
        let instant = m.instant_of(pct, anchor).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 5, 20, 1, 0, 0).unwrap());
    }

    #[test]
    fn open_interval_started_recently_meets_visibility_floor() {
        let m = mapper();
        let anchor = day(2024, 5, 20);
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 3, 0, 0).unwrap();
        let start = now - Duration::minutes(5);
        let pct = m.duration_percent(start, None, anchor, now);
        assert!(pct > 0.0);
        assert!(pct >= m.config().min_visible_percent);
    }

    #[test]
    fn duration_clamps_at_anchor_day_midnight() {
        let m = mapper();
        let anchor = day(2024, 5, 20);
        // 23:00 local start, end 02:00 local next day; visible width is 1h.
        let start = Utc.with_ymd_and_hms(2024, 5, 20, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 20, 17, 0, 0).unwrap();
        let pct = m.duration_percent(start, Some(end), anchor, end);
        assert!((pct - (1.0 / 24.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn percent_pixel_mapping_is_consistent() {
        let m = mapper();
        let px = m.px_of_percent(50.0);
        assert!((px - m.config().strip_width_px / 2.0).abs() < 1e-9);
        assert!((m.percent_of_px(px) - 50.0).abs() < 1e-9);
    }
}
