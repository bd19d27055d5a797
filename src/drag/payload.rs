use serde::{Deserialize, Serialize};

use crate::models::AssignedInterval;

/// Key under which the payload rides the platform's drag-data channel.
pub const DRAG_DATA_KEY: &str = "application/x-studystrip";

/// Reference to a catalog task carried by task drags. The task catalog itself
/// lives outside this engine; only the payload shape is shared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: String,
    pub title: String,
}

/// Tagged payload carried across one drag gesture. A drop target consumes the
/// payload only when its `kind` matches; anything else is a no-op drop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DragPayload {
    StudyTime { interval: AssignedInterval },
    Task { task: TaskRef },
}

impl DragPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Tolerant parse of drag-channel data. Malformed or missing JSON means an
/// invalid drop, never an error surfaced to the user; logged at debug only.
pub fn parse_drag_payload(raw: &str) -> Option<DragPayload> {
    match serde_json::from_str(raw) {
        Ok(payload) => Some(payload),
        Err(err) => {
            log::debug!("ignoring malformed drag payload: {err}");
            None
        }
    }
}
