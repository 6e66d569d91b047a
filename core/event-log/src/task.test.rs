use corestack_protocol::EventPayload;
use corestack_protocol::Mode;
use corestack_protocol::Stage;

use super::*;

#[test]
fn summaries_pick_up_title_from_intent_received() {
    let events = vec![
        Event::new(
            "task-1",
            Mode::Mission,
            Stage::Intent,
            EventPayload::IntentReceived {
                intent: "fix the flaky test".to_string(),
            },
        ),
        Event::new(
            "task-1",
            Mode::Mission,
            Stage::Plan,
            EventPayload::PlanProposed {
                summary: "plan".to_string(),
            },
        ),
    ];
    let summaries = distinct_task_summaries(&events);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].title.as_deref(), Some("fix the flaky test"));
    assert_eq!(summaries[0].event_count, 2);
}

#[test]
fn summaries_sorted_by_last_seen_descending() {
    let mut older = Event::new(
        "task-1",
        Mode::Mission,
        Stage::Intent,
        EventPayload::IntentReceived {
            intent: "first".to_string(),
        },
    );
    older.timestamp = chrono::Utc::now() - chrono::Duration::hours(2);
    let newer = Event::new(
        "task-2",
        Mode::Mission,
        Stage::Intent,
        EventPayload::IntentReceived {
            intent: "second".to_string(),
        },
    );
    let summaries = distinct_task_summaries(&[older, newer]);
    assert_eq!(summaries[0].task_id, "task-2");
    assert_eq!(summaries[1].task_id, "task-1");
}

#[test]
fn cleanly_exited_requires_a_terminal_event() {
    let events = vec![Event::new(
        "task-1",
        Mode::Mission,
        Stage::Verify,
        EventPayload::VerifyStarted { commands: vec![] },
    )];
    assert!(!cleanly_exited(&events));

    let mut with_terminal = events;
    with_terminal.push(Event::new(
        "task-1",
        Mode::Mission,
        Stage::Done,
        EventPayload::MissionCompleted { success: true },
    ));
    assert!(cleanly_exited(&with_terminal));
}

#[test]
fn current_mode_stage_reflects_last_event() {
    let events = vec![
        Event::new(
            "task-1",
            Mode::Answer,
            Stage::None,
            EventPayload::IntentReceived {
                intent: "x".to_string(),
            },
        ),
        Event::new(
            "task-1",
            Mode::Mission,
            Stage::Edit,
            EventPayload::StageChanged {
                from: Stage::Retrieve,
                to: Stage::Edit,
            },
        ),
    ];
    assert_eq!(current_mode_stage(&events), (Mode::Mission, Stage::Edit));
    assert_eq!(current_mode_stage(&[]), (Mode::Answer, Stage::None));
}
