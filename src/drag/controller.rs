use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use log::{debug, error};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::data::{IntervalStore, TimelinePersistence};
use crate::models::AssignedInterval;
use crate::timeline::TimelineMapper;

use super::payload::{parse_drag_payload, DragPayload};

const FALLBACK_RESCHEDULE_MESSAGE: &str = "Could not move the study time. Please try again.";
const FALLBACK_DELETE_MESSAGE: &str = "Could not delete the study time. Please try again.";

/// Gesture state: `Idle -> Dragging -> {DroppedValid, DroppedInvalid,
/// Cancelled} -> Idle`. The terminal drop states are momentary and reported
/// through `DropOutcome`; only Idle/Dragging persist between calls.
#[derive(Debug, Clone, PartialEq)]
enum DragPhase {
    Idle,
    Dragging(DragPayload),
}

/// Result of one completed drop, for the hosting view.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Valid drop, persisted; carries the interval as now displayed.
    Rescheduled(AssignedInterval),
    /// Discard-target drop, persisted; carries the deleted id.
    Deleted(String),
    /// Kind mismatch or unparsable payload; nothing changed.
    Invalid,
    /// Persistence rejected the change; local state was rolled back.
    Failed { message: String },
}

/// Notifications surfaced to the hosting page, in place of a toast layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    RescheduleFailed { interval_id: String, message: String },
    DeleteFailed { interval_id: String, message: String },
}

/// Drag-based rescheduling of assigned intervals.
///
/// A valid drop applies the new interval to the display store first, then
/// awaits the persistence collaborator; failure rolls the store back to the
/// exact pre-drag value. A second drag on the same interval while a call is
/// outstanding is allowed; operation ids make the rollback last-write-wins so
/// a stale failure cannot clobber a newer optimistic state.
pub struct DragController {
    mapper: TimelineMapper,
    store: IntervalStore,
    persistence: Arc<dyn TimelinePersistence>,
    phase: Mutex<DragPhase>,
    pending_ops: Mutex<HashMap<String, Uuid>>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl DragController {
    pub fn new(
        mapper: TimelineMapper,
        store: IntervalStore,
        persistence: Arc<dyn TimelinePersistence>,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                mapper,
                store,
                persistence,
                phase: Mutex::new(DragPhase::Idle),
                pending_ops: Mutex::new(HashMap::new()),
                events,
            },
            receiver,
        )
    }

    fn phase_guard(&self) -> MutexGuard<'_, DragPhase> {
        match self.phase.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn ops_guard(&self) -> MutexGuard<'_, HashMap<String, Uuid>> {
        match self.pending_ops.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Pointer-down-and-move on a draggable interval. Returns the serialized
    /// payload to place on the platform drag-data channel.
    pub fn begin_drag(&self, interval: AssignedInterval) -> Result<String> {
        let payload = DragPayload::StudyTime { interval };
        let json = payload.to_json()?;
        *self.phase_guard() = DragPhase::Dragging(payload);
        Ok(json)
    }

    /// Gesture ended outside any valid drop target. No side effects.
    pub fn cancel_drag(&self) {
        *self.phase_guard() = DragPhase::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(*self.phase_guard(), DragPhase::Dragging(_))
    }

    /// Drop on a day cell: the interval keeps its local start/end time-of-day
    /// and total duration; only the date component changes.
    pub async fn drop_on_day(&self, raw_payload: &str, target_day: NaiveDate) -> DropOutcome {
        let interval = match self.take_study_time(raw_payload) {
            Some(interval) => interval,
            None => return DropOutcome::Invalid,
        };

        let Some(new_start) = self.start_on_day(&interval, target_day) else {
            debug!("drop ignored: cannot place {} on {target_day}", interval.id);
            return DropOutcome::Invalid;
        };
        self.reschedule(interval, new_start).await
    }

    /// Drop at a position on the anchor day's strip: the start moves to the
    /// snapped instant under the pointer, duration preserved.
    pub async fn drop_at_percent(
        &self,
        raw_payload: &str,
        anchor_day: NaiveDate,
        percent: f64,
    ) -> DropOutcome {
        let interval = match self.take_study_time(raw_payload) {
            Some(interval) => interval,
            None => return DropOutcome::Invalid,
        };

        let Some(new_start) = self.mapper.instant_of(percent, anchor_day) else {
            debug!("drop ignored: no instant at {percent}% on {anchor_day}");
            return DropOutcome::Invalid;
        };
        self.reschedule(interval, new_start).await
    }

    /// Drop on the discard target: delete instead of reschedule, with the
    /// same optimistic/rollback discipline.
    pub async fn drop_on_discard(&self, raw_payload: &str) -> DropOutcome {
        let interval = match self.take_study_time(raw_payload) {
            Some(interval) => interval,
            None => return DropOutcome::Invalid,
        };

        let op_id = self.begin_op(&interval.id);
        let previous = self.store.remove(&interval.id);

        match self.persistence.delete_assigned(&interval.id).await {
            Ok(()) => {
                self.finish_op(&interval.id, op_id);
                DropOutcome::Deleted(interval.id)
            }
            Err(err) => {
                let message = failure_message(&err, FALLBACK_DELETE_MESSAGE);
                if self.finish_op(&interval.id, op_id) {
                    if let Some(prev) = previous {
                        self.store.apply(prev);
                    }
                    error!("delete of {} failed: {message}", interval.id);
                    let _ = self.events.send(EngineEvent::DeleteFailed {
                        interval_id: interval.id.clone(),
                        message: message.clone(),
                    });
                }
                DropOutcome::Failed { message }
            }
        }
    }

    /// Consume the gesture and extract a study-time payload; any other kind
    /// or unparsable data is an invalid drop, logged at debug only.
    fn take_study_time(&self, raw_payload: &str) -> Option<AssignedInterval> {
        *self.phase_guard() = DragPhase::Idle;
        match parse_drag_payload(raw_payload)? {
            DragPayload::StudyTime { interval } => Some(interval),
            DragPayload::Task { task } => {
                debug!("drop ignored: task payload {} on a study-time target", task.id);
                None
            }
        }
    }

    fn start_on_day(
        &self,
        interval: &AssignedInterval,
        target_day: NaiveDate,
    ) -> Option<DateTime<Utc>> {
        let tz = self.mapper.config().display_tz;
        let local_time = interval.start.with_timezone(&tz).time();
        tz.from_local_datetime(&target_day.and_time(local_time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    async fn reschedule(
        &self,
        interval: AssignedInterval,
        new_start: DateTime<Utc>,
    ) -> DropOutcome {
        let duration: Duration = interval.end - interval.start;
        let mut updated = interval.clone();
        updated.start = new_start;
        updated.end = new_start + duration;

        // Optimistic apply first so the UI feels immediate.
        let op_id = self.begin_op(&interval.id);
        let previous = self.store.apply(updated.clone());

        match self
            .persistence
            .update_assigned(&interval.id, updated.start, updated.end)
            .await
        {
            Ok(_) => {
                // Local state is already correct; nothing further to do.
                self.finish_op(&interval.id, op_id);
                DropOutcome::Rescheduled(updated)
            }
            Err(err) => {
                let message = failure_message(&err, FALLBACK_RESCHEDULE_MESSAGE);
                if self.finish_op(&interval.id, op_id) {
                    self.store.revert(&interval.id, previous);
                    error!("reschedule of {} failed: {message}", interval.id);
                    let _ = self.events.send(EngineEvent::RescheduleFailed {
                        interval_id: interval.id.clone(),
                        message: message.clone(),
                    });
                }
                DropOutcome::Failed { message }
            }
        }
    }

    fn begin_op(&self, interval_id: &str) -> Uuid {
        let op_id = Uuid::new_v4();
        self.ops_guard().insert(interval_id.to_string(), op_id);
        op_id
    }

    /// Clear the pending op if `op_id` is still the latest for the interval.
    /// Returns false when a newer operation has taken over, in which case the
    /// stale response must not touch local state.
    fn finish_op(&self, interval_id: &str, op_id: Uuid) -> bool {
        let mut ops = self.ops_guard();
        if ops.get(interval_id) == Some(&op_id) {
            ops.remove(interval_id);
            true
        } else {
            false
        }
    }
}

fn failure_message(err: &anyhow::Error, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use crate::data::MemoryStore;
    use chrono::NaiveDate;

    fn mapper() -> TimelineMapper {
        TimelineMapper::new(TimelineConfig::default())
    }

    /// Assigned 10:00-11:30 local on 2024-05-20 (+09:00), i.e. 01:00-02:30 UTC.
    fn sample_interval() -> AssignedInterval {
        AssignedInterval::new(
            "a1",
            "s1",
            "act1",
            "math drills",
            Utc.with_ymd_and_hms(2024, 5, 20, 1, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 20, 2, 30, 0).unwrap(),
        )
        .unwrap()
    }

    fn setup() -> (
        DragController,
        mpsc::UnboundedReceiver<EngineEvent>,
        IntervalStore,
        MemoryStore,
    ) {
        let backend = MemoryStore::new();
        backend.seed_assigned(vec![sample_interval()]);
        let display = IntervalStore::new();
        display.replace_all(vec![sample_interval()]);
        let (controller, events) =
            DragController::new(mapper(), display.clone(), Arc::new(backend.clone()));
        (controller, events, display, backend)
    }

    #[tokio::test]
    async fn day_drop_preserves_time_of_day_and_duration() {
        let (controller, _events, display, _backend) = setup();
        let payload = controller.begin_drag(sample_interval()).unwrap();
        assert!(controller.is_dragging());

        let target = NaiveDate::from_ymd_opt(2024, 5, 23).unwrap();
        let outcome = controller.drop_on_day(&payload, target).await;

        let moved = match outcome {
            DropOutcome::Rescheduled(interval) => interval,
            other => panic!("expected reschedule, got {other:?}"),
        };
        assert!(!controller.is_dragging());

        // Still 10:00-11:30 local, now on the 23rd; 90 minutes exactly.
        assert_eq!(moved.start, Utc.with_ymd_and_hms(2024, 5, 23, 1, 0, 0).unwrap());
        assert_eq!(moved.end, Utc.with_ymd_and_hms(2024, 5, 23, 2, 30, 0).unwrap());
        assert_eq!((moved.end - moved.start).num_minutes(), 90);
        assert_eq!(display.get("a1"), Some(moved));
    }

    #[tokio::test]
    async fn failed_reschedule_rolls_back_and_notifies_once() {
        let (controller, mut events, display, backend) = setup();
        backend.fail_next_update("schedule conflict on server");

        let before = display.get("a1").unwrap();
        let payload = controller.begin_drag(sample_interval()).unwrap();
        let target = NaiveDate::from_ymd_opt(2024, 5, 23).unwrap();
        let outcome = controller.drop_on_day(&payload, target).await;

        match outcome {
            DropOutcome::Failed { message } => {
                assert_eq!(message, "schedule conflict on server")
            }
            other => panic!("expected failure, got {other:?}"),
        }

        // Display reverted exactly; one notification, no more.
        assert_eq!(display.get("a1"), Some(before));
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            EngineEvent::RescheduleFailed {
                interval_id: "a1".into(),
                message: "schedule conflict on server".into(),
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn task_payload_on_study_time_target_is_a_no_op() {
        let (controller, _events, display, backend) = setup();
        let before = display.snapshot();

        let task_json = DragPayload::Task {
            task: crate::drag::TaskRef {
                id: "t1".into(),
                title: "worksheet".into(),
            },
        }
        .to_json()
        .unwrap();

        let target = NaiveDate::from_ymd_opt(2024, 5, 23).unwrap();
        let outcome = controller.drop_on_day(&task_json, target).await;

        assert_eq!(outcome, DropOutcome::Invalid);
        assert_eq!(display.snapshot(), before);
        assert_eq!(backend.update_calls(), 0);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_no_op() {
        let (controller, _events, display, backend) = setup();
        let before = display.snapshot();

        let target = NaiveDate::from_ymd_opt(2024, 5, 23).unwrap();
        let outcome = controller.drop_on_day("{{{", target).await;

        assert_eq!(outcome, DropOutcome::Invalid);
        assert_eq!(display.snapshot(), before);
        assert_eq!(backend.update_calls(), 0);
    }

    #[tokio::test]
    async fn cancel_leaves_everything_untouched() {
        let (controller, _events, display, backend) = setup();
        let before = display.snapshot();

        controller.begin_drag(sample_interval()).unwrap();
        controller.cancel_drag();

        assert!(!controller.is_dragging());
        assert_eq!(display.snapshot(), before);
        assert_eq!(backend.update_calls(), 0);
    }

    #[tokio::test]
    async fn discard_drop_deletes_and_rolls_back_on_failure() {
        let (controller, mut events, display, backend) = setup();

        // Successful delete removes the interval from display and backend.
        let payload = controller.begin_drag(sample_interval()).unwrap();
        let outcome = controller.drop_on_discard(&payload).await;
        assert_eq!(outcome, DropOutcome::Deleted("a1".into()));
        assert_eq!(display.get("a1"), None);
        assert!(backend.assigned_snapshot().is_empty());

        // Failed delete restores the display snapshot.
        backend.seed_assigned(vec![sample_interval()]);
        display.replace_all(vec![sample_interval()]);
        backend.fail_next_delete("");

        let payload = controller.begin_drag(sample_interval()).unwrap();
        let outcome = controller.drop_on_discard(&payload).await;
        match outcome {
            DropOutcome::Failed { message } => assert_eq!(message, FALLBACK_DELETE_MESSAGE),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(display.get("a1"), Some(sample_interval()));
        assert!(matches!(
            events.recv().await.unwrap(),
            EngineEvent::DeleteFailed { .. }
        ));
    }

    #[tokio::test]
    async fn percent_drop_snaps_start_and_keeps_duration() {
        let (controller, _events, display, _backend) = setup();
        let payload = controller.begin_drag(sample_interval()).unwrap();

        // ~13:07 local on the anchor day snaps to 13:00.
        let anchor = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let pct = (13.0 * 60.0 + 7.0) / 1440.0 * 100.0;
        let outcome = controller.drop_at_percent(&payload, anchor, pct).await;

        let moved = match outcome {
            DropOutcome::Rescheduled(interval) => interval,
            other => panic!("expected reschedule, got {other:?}"),
        };
        // 13:00 local is 04:00 UTC.
        assert_eq!(moved.start, Utc.with_ymd_and_hms(2024, 5, 20, 4, 0, 0).unwrap());
        assert_eq!((moved.end - moved.start).num_minutes(), 90);
        assert_eq!(display.get("a1"), Some(moved));
    }
}
