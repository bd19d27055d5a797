//! Study-time timeline engine.
//!
//! Renders nothing itself: given assigned study blocks and monitored actual
//! sessions it computes strip positions on a fixed-timezone 24-hour day,
//! striped progress segments, synchronized pane offsets, a live "now" marker,
//! and drag-based rescheduling with optimistic persistence.

pub mod clock;
pub mod config;
pub mod data;
pub mod drag;
pub mod models;
pub mod scroll;
pub mod timeline;
pub mod utils;

pub use clock::NowMarker;
pub use config::TimelineConfig;
pub use data::{IntervalStore, MemoryStore, TimelineFetch, TimelinePersistence};
pub use drag::{DragController, DragPayload, DropOutcome, EngineEvent, TaskRef, DRAG_DATA_KEY};
pub use models::{
    ActualInterval, ActualSource, AssignedInterval, ScrollState, SegmentStatus, TimelineSegment,
};
pub use scroll::ScrollSync;
pub use timeline::{build_progress, TimelineMapper};
