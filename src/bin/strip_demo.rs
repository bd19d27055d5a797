//! Seeds one student's day into the in-memory store, prints the progress
//! strip for each assigned block, then simulates a drag to another day.
//!
//! Run with `RUST_LOG=debug` for the engine's internal logging.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use log::info;

use studystrip::{
    build_progress, ActualInterval, ActualSource, AssignedInterval, DragController, DropOutcome,
    IntervalStore, MemoryStore, NowMarker, ScrollSync, TimelineConfig, TimelineFetch,
    TimelineMapper,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("studystrip demo starting up...");

    let mapper = TimelineMapper::new(TimelineConfig::default());
    let backend = MemoryStore::new();

    // One assigned hour 10:00-11:00 local (+09:00) with two monitored
    // sessions covering parts of it.
    let assigned = AssignedInterval::new(
        "a1",
        "student-1",
        "act-math",
        "math drills",
        Utc.with_ymd_and_hms(2024, 5, 20, 1, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 5, 20, 2, 0, 0).unwrap(),
    )?;
    backend.seed_assigned(vec![assigned.clone()]);
    backend.seed_actual(vec![
        ActualInterval {
            id: "m1".into(),
            start: assigned.start + Duration::minutes(10),
            end: Some(assigned.start + Duration::minutes(30)),
            source: ActualSource::Discord,
        },
        ActualInterval {
            id: "m2".into(),
            start: assigned.start + Duration::minutes(45),
            end: Some(assigned.end),
            source: ActualSource::Zoom,
        },
    ]);
    backend.link("a1", "m1");
    backend.link("a1", "m2");

    let anchor_day = mapper.local_date(assigned.start);
    let display = IntervalStore::new();
    display.replace_all(
        backend
            .list_assigned("student-1", assigned.start - Duration::days(1), assigned.end + Duration::days(1))
            .await?,
    );

    for block in display.snapshot() {
        let actuals = backend.list_actual_for(&block.id).await?;
        println!("{} ({})", block.title, block.id);
        for segment in build_progress(&block, &actuals) {
            println!(
                "  {:6.2}% .. {:6.2}%  {:?}",
                segment.start_pct, segment.end_pct, segment.status
            );
        }
    }

    // Live marker and pane sync, torn down before exit.
    let marker = NowMarker::new(mapper.clone(), anchor_day);
    marker.spawn_ticker();
    println!("now marker on {anchor_day}: {:?}", marker.position());

    let scroll = ScrollSync::new(mapper.clone());
    scroll.spawn_reconciler();
    if let Some(pct) = mapper.position_of(assigned.start, anchor_day) {
        let px = scroll.scroll_to_percent(pct);
        println!("jumped both panes to {px:.0}px");
    }

    // Drag the block three days forward; time-of-day and duration survive.
    let (drag, mut events) = DragController::new(mapper, display.clone(), Arc::new(backend));
    let payload = drag.begin_drag(assigned)?;
    let target = anchor_day + Duration::days(3);
    match drag.drop_on_day(&payload, target).await {
        DropOutcome::Rescheduled(moved) => {
            println!("rescheduled to {} .. {}", moved.start, moved.end)
        }
        outcome => println!("drop outcome: {outcome:?}"),
    }
    while let Ok(event) = events.try_recv() {
        println!("engine event: {event:?}");
    }

    scroll.shutdown();
    marker.shutdown();
    Ok(())
}
