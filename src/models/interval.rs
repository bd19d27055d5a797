use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an observed study session was monitored from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActualSource {
    Discord,
    Zoom,
    Other,
}

impl ActualSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActualSource::Discord => "discord",
            ActualSource::Zoom => "zoom",
            ActualSource::Other => "other",
        }
    }
}

/// A planned study block authored by staff. The calendar day it belongs to is
/// implied by `start`'s local date in the display timezone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignedInterval {
    pub id: String,
    pub student_id: String,
    pub activity_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AssignedInterval {
    /// Build an assigned interval, enforcing `start < end`.
    pub fn new(
        id: impl Into<String>,
        student_id: impl Into<String>,
        activity_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        if start >= end {
            return Err(anyhow!("assigned interval must have start < end"));
        }
        Ok(Self {
            id: id.into(),
            student_id: student_id.into(),
            activity_id: activity_id.into(),
            title: title.into(),
            start,
            end,
        })
    }

    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// An observed study session. `end == None` means the session is still in
/// progress; it is treated as ending "now" for display math but never written
/// back with a concrete end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActualInterval {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub source: ActualSource,
}

impl ActualInterval {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Effective end for duration/position computations.
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end.unwrap_or(now)
    }
}
