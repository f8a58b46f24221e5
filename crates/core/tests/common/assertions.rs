//! Event collection and assertion helpers.

use gp_protocol::ipc::Event;
use gp_protocol::stage_models::StageKind;
use tokio::sync::mpsc;

/// Drain every event that is already queued.
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Stages in the order their `StageCompleted` events were sent.
pub fn completed_stages(events: &[Event]) -> Vec<StageKind> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StageCompleted { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect()
}

pub fn failed_stages(events: &[Event]) -> Vec<StageKind> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect()
}

pub fn has_run_completed(events: &[Event]) -> bool {
    events.iter().any(|e| matches!(e, Event::RunCompleted { .. }))
}

/// Assert the first event resets the run.
pub fn assert_starts_with_reset(events: &[Event]) {
    assert!(
        matches!(events.first(), Some(Event::RunReset { .. })),
        "First event should be RunReset, got: {:?}",
        events.first()
    );
}
