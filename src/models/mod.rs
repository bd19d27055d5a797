pub mod interval;
pub mod scroll;
pub mod segment;

pub use interval::{ActualInterval, ActualSource, AssignedInterval};
pub use scroll::ScrollState;
pub use segment::{SegmentStatus, TimelineSegment};
