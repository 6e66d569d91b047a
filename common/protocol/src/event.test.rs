use super::*;

#[test]
fn event_type_matches_payload_tag_on_the_wire() {
    let event = Event::new(
        "task-1",
        Mode::Mission,
        Stage::Verify,
        EventPayload::VerifyCompleted {
            status: VerifyStatus::Pass,
            failed_command: None,
            exit_code: Some(0),
            transcript_evidence_id: Some("ev-1".to_string()),
        },
    );
    assert_eq!(event.event_type(), EventType::VerifyCompleted);

    let json = serde_json::to_value(&event).expect("serialize");
    assert_eq!(json["payload"]["type"], "verify_completed");
}

#[test]
fn unknown_type_tag_fails_to_deserialize() {
    let raw = serde_json::json!({
        "event_id": "e1",
        "task_id": "t1",
        "timestamp": "2026-01-01T00:00:00Z",
        "mode": "MISSION",
        "stage": "verify",
        "payload": { "type": "not_a_real_event_type" },
        "evidence_ids": [],
        "parent_event_id": null,
    });
    let result: Result<Event, _> = serde_json::from_value(raw);
    assert!(result.is_err());
}

#[test]
fn round_trips_through_json() {
    let event = Event::new(
        "task-1",
        Mode::Plan,
        Stage::Plan,
        EventPayload::PlanProposed {
            summary: "do the thing".to_string(),
        },
    )
    .with_evidence(vec!["ev-1".to_string()])
    .with_parent("parent-1");

    let json = serde_json::to_string(&event).expect("serialize");
    let restored: Event = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored.event_id, event.event_id);
    assert_eq!(restored.evidence_ids, vec!["ev-1".to_string()]);
    assert_eq!(restored.parent_event_id.as_deref(), Some("parent-1"));
    assert_eq!(restored.event_type(), EventType::PlanProposed);
}

#[test]
fn terminal_payloads_are_classified() {
    assert!(EventPayload::MissionCompleted { success: true }.is_terminal());
    assert!(EventPayload::AutonomyCompleted.is_terminal());
    assert!(
        EventPayload::AutonomyHalted {
            reason: "mode change".to_string()
        }
        .is_terminal()
    );
    assert!(!EventPayload::IntentReceived { intent: "x".to_string() }.is_terminal());
}
