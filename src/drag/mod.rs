pub mod controller;
pub mod payload;

pub use controller::{DragController, DropOutcome, EngineEvent};
pub use payload::{parse_drag_payload, DragPayload, TaskRef, DRAG_DATA_KEY};
