use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ActualInterval, AssignedInterval};

use super::{TimelineFetch, TimelinePersistence};

#[derive(Default)]
struct MemoryInner {
    assigned: Vec<AssignedInterval>,
    actual: Vec<ActualInterval>,
    /// assigned id -> connected actual ids
    links: HashMap<String, Vec<String>>,
    fail_next_update: Option<String>,
    fail_next_delete: Option<String>,
    update_calls: u32,
    delete_calls: u32,
}

/// In-memory fetch/persistence collaborator for tests and the demo binary.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn seed_assigned(&self, intervals: Vec<AssignedInterval>) {
        self.lock().assigned = intervals;
    }

    pub fn seed_actual(&self, intervals: Vec<ActualInterval>) {
        self.lock().actual = intervals;
    }

    pub fn link(&self, assigned_id: &str, actual_id: &str) {
        self.lock()
            .links
            .entry(assigned_id.to_string())
            .or_default()
            .push(actual_id.to_string());
    }

    /// Script the next update call to fail with `message`.
    pub fn fail_next_update(&self, message: &str) {
        self.lock().fail_next_update = Some(message.to_string());
    }

    /// Script the next delete call to fail with `message`.
    pub fn fail_next_delete(&self, message: &str) {
        self.lock().fail_next_delete = Some(message.to_string());
    }

    pub fn assigned_snapshot(&self) -> Vec<AssignedInterval> {
        self.lock().assigned.clone()
    }

    /// Number of update round trips issued so far.
    pub fn update_calls(&self) -> u32 {
        self.lock().update_calls
    }

    /// Number of delete round trips issued so far.
    pub fn delete_calls(&self) -> u32 {
        self.lock().delete_calls
    }
}

#[async_trait]
impl TimelineFetch for MemoryStore {
    async fn list_assigned(
        &self,
        student_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AssignedInterval>> {
        Ok(self
            .lock()
            .assigned
            .iter()
            .filter(|i| i.student_id == student_id && i.start < range_end && i.end > range_start)
            .cloned()
            .collect())
    }

    async fn list_actual(
        &self,
        _student_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<ActualInterval>> {
        let now = Utc::now();
        Ok(self
            .lock()
            .actual
            .iter()
            .filter(|i| i.start < range_end && i.end_or(now) > range_start)
            .cloned()
            .collect())
    }

    async fn list_actual_for(&self, assigned_id: &str) -> Result<Vec<ActualInterval>> {
        let guard = self.lock();
        let ids = guard.links.get(assigned_id).cloned().unwrap_or_default();
        Ok(guard
            .actual
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TimelinePersistence for MemoryStore {
    async fn update_assigned(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AssignedInterval> {
        let mut guard = self.lock();
        guard.update_calls += 1;
        if let Some(message) = guard.fail_next_update.take() {
            return Err(anyhow!(message));
        }
        let slot = guard
            .assigned
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| anyhow!("assigned interval {id} not found"))?;
        slot.start = start;
        slot.end = end;
        Ok(slot.clone())
    }

    async fn delete_assigned(&self, id: &str) -> Result<()> {
        let mut guard = self.lock();
        guard.delete_calls += 1;
        if let Some(message) = guard.fail_next_delete.take() {
            return Err(anyhow!(message));
        }
        let idx = guard
            .assigned
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| anyhow!("assigned interval {id} not found"))?;
        guard.assigned.remove(idx);
        Ok(())
    }
}
