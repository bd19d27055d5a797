use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offsets of the two panes plus the last moment the user scrolled by hand.
///
/// Outside of a brief synchronization window the two offsets are equal; the
/// reconciler enforces this whenever they drift apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    pub header_offset: f64,
    pub body_offset: f64,
    pub last_user_interaction_at: Option<DateTime<Utc>>,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            header_offset: 0.0,
            body_offset: 0.0,
            last_user_interaction_at: None,
        }
    }
}

impl ScrollState {
    pub fn drift(&self) -> f64 {
        (self.header_offset - self.body_offset).abs()
    }
}
