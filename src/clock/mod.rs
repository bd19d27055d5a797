pub mod marker;

pub use marker::NowMarker;
