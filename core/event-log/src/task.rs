//! Derived per-task views over the event stream (spec.md §3 "Task").
//!
//! A task is never independently persisted; everything here is computed
//! on demand from `Vec<Event>`.

use chrono::DateTime;
use chrono::Utc;
use corestack_protocol::Event;
use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

/// One row of `distinct_task_summaries()` (spec.md §4.1).
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub task_id: String,
    pub title: Option<String>,
    pub mode: Mode,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub event_count: usize,
}

/// Build one summary row per distinct `task_id` present in `events`,
/// sorted by `last_seen` descending.
pub fn distinct_task_summaries(events: &[Event]) -> Vec<TaskSummary> {
    let mut summaries: Vec<TaskSummary> = Vec::new();
    for event in events {
        if let Some(summary) = summaries.iter_mut().find(|s| s.task_id == event.task_id) {
            summary.event_count += 1;
            summary.mode = event.mode;
            if event.timestamp > summary.last_seen {
                summary.last_seen = event.timestamp;
            }
            if event.timestamp < summary.first_seen {
                summary.first_seen = event.timestamp;
            }
        } else {
            let title = match &event.payload {
                EventPayload::IntentReceived { intent } => Some(intent.clone()),
                _ => None,
            };
            summaries.push(TaskSummary {
                task_id: event.task_id.clone(),
                title,
                mode: event.mode,
                first_seen: event.timestamp,
                last_seen: event.timestamp,
                event_count: 1,
            });
        }
    }
    // The title only arrives with the first `intent_received` event; a
    // later pass fills it in if that event wasn't the first one observed
    // for its task_id (append order guarantees it normally is, but this
    // keeps the view correct even out of strict order).
    for summary in &mut summaries {
        if summary.title.is_none() {
            summary.title = events
                .iter()
                .filter(|e| e.task_id == summary.task_id)
                .find_map(|e| match &e.payload {
                    EventPayload::IntentReceived { intent } => Some(intent.clone()),
                    _ => None,
                });
        }
    }
    summaries.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    summaries
}

/// Whether `events` (all belonging to one task) end in a terminal payload.
pub fn cleanly_exited(events: &[Event]) -> bool {
    events.iter().any(|e| e.payload.is_terminal())
}

/// The latest timestamp among `events`, if any.
pub fn last_updated_at(events: &[Event]) -> Option<DateTime<Utc>> {
    events.iter().map(|e| e.timestamp).max()
}

/// The current `(mode, stage)` for a task: the mode/stage of the
/// last-appended event, or `(ANSWER, none)` if the task has no events yet.
pub fn current_mode_stage(events: &[Event]) -> (Mode, Stage) {
    events
        .last()
        .map(|e| (e.mode, e.stage))
        .unwrap_or((Mode::Answer, Stage::None))
}

#[cfg(test)]
#[path = "task.test.rs"]
mod tests;
