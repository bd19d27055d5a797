pub mod mapper;
pub mod progress;

pub use mapper::TimelineMapper;
pub use progress::build_progress;
