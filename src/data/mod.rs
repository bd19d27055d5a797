mod memory;
mod store;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ActualInterval, AssignedInterval};

pub use memory::MemoryStore;
pub use store::IntervalStore;

/// Read side of the data-fetch collaborator: per student, per visible range.
#[async_trait]
pub trait TimelineFetch: Send + Sync {
    async fn list_assigned(
        &self,
        student_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AssignedInterval>>;

    async fn list_actual(
        &self,
        student_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<ActualInterval>>;

    /// Actual sessions connected to one assigned block, consumed by the
    /// progress segmenter.
    async fn list_actual_for(&self, assigned_id: &str) -> Result<Vec<ActualInterval>>;
}

/// Write side used by drag rescheduling. The engine only proposes mutations;
/// the collaborator owns the records and confirms or rejects each round trip.
#[async_trait]
pub trait TimelinePersistence: Send + Sync {
    async fn update_assigned(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AssignedInterval>;

    async fn delete_assigned(&self, id: &str) -> Result<()>;
}
