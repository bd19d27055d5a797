use serde::{Deserialize, Serialize};

use super::ActualSource;

/// Whether a stretch of an assigned interval was covered by a monitored session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentStatus {
    Connected,
    NotConnected,
}

/// One contiguous stretch of an assigned interval's progress bar.
///
/// `start_pct`/`end_pct` are positions relative to the assigned interval's own
/// duration: 0 is the assigned start, 100 the assigned end. A full strip is an
/// ordered, gap-free sequence of these covering exactly [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSegment {
    pub start_pct: f64,
    pub end_pct: f64,
    pub status: SegmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ActualSource>,
}

impl TimelineSegment {
    pub fn connected(start_pct: f64, end_pct: f64, source: ActualSource) -> Self {
        Self {
            start_pct,
            end_pct,
            status: SegmentStatus::Connected,
            source: Some(source),
        }
    }

    pub fn gap(start_pct: f64, end_pct: f64) -> Self {
        Self {
            start_pct,
            end_pct,
            status: SegmentStatus::NotConnected,
            source: None,
        }
    }

    pub fn width_pct(&self) -> f64 {
        self.end_pct - self.start_pct
    }
}
