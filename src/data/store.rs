use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::AssignedInterval;

/// Local display snapshot of the assigned intervals on screen.
///
/// Written from two places only: the drag controller's optimistic
/// apply/rollback and the fetch collaborator's wholesale refresh. Concurrent
/// writes resolve as last-write-observed-wins, with no merge logic.
#[derive(Clone, Default)]
pub struct IntervalStore {
    inner: Arc<Mutex<Vec<AssignedInterval>>>,
}

impl IntervalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AssignedInterval>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the whole snapshot, as a fetch refresh does.
    pub fn replace_all(&self, intervals: Vec<AssignedInterval>) {
        *self.lock() = intervals;
    }

    pub fn snapshot(&self) -> Vec<AssignedInterval> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<AssignedInterval> {
        self.lock().iter().find(|i| i.id == id).cloned()
    }

    /// Upsert one interval, returning the value it displaced so a failed
    /// persistence call can roll back to exactly the pre-operation state.
    pub fn apply(&self, interval: AssignedInterval) -> Option<AssignedInterval> {
        let mut guard = self.lock();
        if let Some(slot) = guard.iter_mut().find(|i| i.id == interval.id) {
            Some(std::mem::replace(slot, interval))
        } else {
            guard.push(interval);
            None
        }
    }

    pub fn remove(&self, id: &str) -> Option<AssignedInterval> {
        let mut guard = self.lock();
        let idx = guard.iter().position(|i| i.id == id)?;
        Some(guard.remove(idx))
    }

    /// Undo an optimistic apply: restore the displaced value, or drop the
    /// interval entirely if the apply had inserted it.
    pub fn revert(&self, id: &str, previous: Option<AssignedInterval>) {
        match previous {
            Some(prev) => {
                self.apply(prev);
            }
            None => {
                self.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn interval(id: &str, hour: u32) -> AssignedInterval {
        AssignedInterval::new(
            id,
            "s1",
            "act1",
            "reading",
            Utc.with_ymd_and_hms(2024, 5, 20, hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 20, hour + 1, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn apply_returns_displaced_value_and_revert_restores_it() {
        let store = IntervalStore::new();
        let original = interval("a", 9);
        store.replace_all(vec![original.clone()]);

        let moved = interval("a", 11);
        let previous = store.apply(moved.clone());
        assert_eq!(previous, Some(original.clone()));
        assert_eq!(store.get("a"), Some(moved));

        store.revert("a", previous);
        assert_eq!(store.get("a"), Some(original));
    }

    #[test]
    fn revert_of_an_insert_removes_the_interval() {
        let store = IntervalStore::new();
        let previous = store.apply(interval("b", 10));
        assert_eq!(previous, None);
        store.revert("b", previous);
        assert_eq!(store.get("b"), None);
    }
}
