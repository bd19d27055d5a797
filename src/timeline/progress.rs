use chrono::{DateTime, Utc};

use crate::models::{ActualInterval, ActualSource, AssignedInterval, TimelineSegment};

/// Raw connected stretch before gap filling.
#[derive(Debug, Clone, Copy)]
struct Covered {
    start_pct: f64,
    end_pct: f64,
    source: ActualSource,
}

/// Build the striped progress strip for one assigned interval: an ordered,
/// gap-free, non-overlapping sequence of segments covering exactly [0, 100],
/// where 0 is the assigned start and 100 the assigned end.
///
/// Overlapping actual intervals are resolved earliest-start-wins: a later
/// interval's overlapped portion is truncated to begin where the previous
/// connected segment ended, so covered time is never double-counted.
pub fn build_progress(
    assigned: &AssignedInterval,
    actuals: &[ActualInterval],
) -> Vec<TimelineSegment> {
    let total_secs = assigned.duration_secs();
    if total_secs <= 0 {
        return vec![TimelineSegment::gap(0.0, 100.0)];
    }

    // Step 1: open sessions contribute no closed segment here; the live
    // marker renders them separately.
    // Step 2: clip each closed interval to the assigned window, dropping
    // anything with no positive width left.
    // Step 3: convert to percents of the assigned interval's own length.
    let mut covered: Vec<Covered> = actuals
        .iter()
        .filter_map(|actual| {
            let end = actual.end?;
            clip_to_assigned(assigned, actual.start, end, total_secs, actual.source)
        })
        .collect();

    if covered.is_empty() {
        return vec![TimelineSegment::gap(0.0, 100.0)];
    }

    // Step 4: order by position along the assigned interval.
    covered.sort_by(|a, b| {
        a.start_pct
            .partial_cmp(&b.start_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Step 5: walk left to right, inserting not-connected filler in the gaps
    // and truncating overlaps against the position already consumed.
    let mut segments = Vec::with_capacity(covered.len() * 2 + 1);
    let mut pos = 0.0_f64;

    for c in covered {
        if c.end_pct <= pos {
            // Fully inside an earlier connected stretch.
            continue;
        }
        let start = c.start_pct.max(pos);
        if start > pos {
            segments.push(TimelineSegment::gap(pos, start));
        }
        segments.push(TimelineSegment::connected(start, c.end_pct, c.source));
        pos = c.end_pct;
    }

    if pos < 100.0 {
        segments.push(TimelineSegment::gap(pos, 100.0));
    }

    segments
}

fn clip_to_assigned(
    assigned: &AssignedInterval,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    total_secs: i64,
    source: ActualSource,
) -> Option<Covered> {
    let clipped_start = start.max(assigned.start);
    let clipped_end = end.min(assigned.end);
    let width_secs = (clipped_end - clipped_start).num_seconds();
    if width_secs <= 0 {
        return None;
    }

    let offset_secs = (clipped_start - assigned.start).num_seconds();
    let start_pct = pct_of(offset_secs, total_secs);
    let end_pct = pct_of(offset_secs + width_secs, total_secs);
    Some(Covered {
        start_pct,
        end_pct,
        source,
    })
}

fn pct_of(secs: i64, total_secs: i64) -> f64 {
    (secs as f64 / total_secs as f64 * 100.0).clamp(0.0, 100.0)
}
