//! Crash recovery (spec.md §4.15): at startup, scan the event store,
//! classify which tasks were interrupted by an unclean shutdown, and
//! recommend one of `resume | restore_checkpoint | discard`.

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use corestack_event_log::EventStore;
use corestack_event_log::cleanly_exited;
use corestack_event_log::distinct_task_summaries;
use corestack_event_log::last_updated_at;
use corestack_protocol::EventPayload;

/// Age past which an interrupted task is no longer worth resuming
/// (spec.md §4.15 recommendation table).
const DISCARD_AGE_HOURS: i64 = 24;

/// The three recovery options offered for an interrupted task (spec.md
/// §4.15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryRecommendation {
    Resume,
    RestoreCheckpoint,
    Discard,
}

/// One interrupted task's recovery analysis.
#[derive(Debug, Clone)]
pub struct TaskRecoveryAnalysis {
    pub task_id: String,
    pub last_updated_at: DateTime<Utc>,
    pub has_checkpoint: bool,
    pub recommendation: RecoveryRecommendation,
}

/// Pure recommendation function (spec.md §4.15 table), so the policy can
/// be unit-tested without an event store (used directly by S6).
pub fn recommend(age: Duration, has_checkpoint: bool) -> RecoveryRecommendation {
    if age >= Duration::hours(DISCARD_AGE_HOURS) {
        RecoveryRecommendation::Discard
    } else if has_checkpoint {
        RecoveryRecommendation::RestoreCheckpoint
    } else {
        RecoveryRecommendation::Resume
    }
}

/// Scan every task in `store`, keep only those that did not cleanly exit,
/// and produce a recovery analysis for each, ordered by least-recently
/// updated first (the tasks most likely to need attention).
pub async fn analyze_tasks(store: &EventStore, now: DateTime<Utc>) -> Vec<TaskRecoveryAnalysis> {
    let all = store.get_all().await;
    let mut out = Vec::new();
    for summary in distinct_task_summaries(&all) {
        let events = store.get_by_task(&summary.task_id).await;
        if cleanly_exited(&events) {
            continue;
        }
        let last_seen = last_updated_at(&events).unwrap_or(summary.last_seen);
        let has_checkpoint = events.iter().any(|e| matches!(e.payload, EventPayload::CheckpointCreated { .. }));
        let age = now - last_seen;
        out.push(TaskRecoveryAnalysis {
            task_id: summary.task_id,
            last_updated_at: last_seen,
            has_checkpoint,
            recommendation: recommend(age, has_checkpoint),
        });
    }
    out.sort_by(|a, b| a.last_updated_at.cmp(&b.last_updated_at));
    out
}

#[cfg(test)]
#[path = "recovery.test.rs"]
mod tests;
