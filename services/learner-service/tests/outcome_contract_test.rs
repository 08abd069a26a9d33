//! Wire-contract checks for outcome events: Ingest forwards these payloads
//! and the tracker's outcome emitter produces them, so field names and the
//! closed type set must stay stable.

use routing_models::{Outcome, OutcomeType};

#[test]
fn minimal_resolved_event_parses() {
    let outcome: Outcome = serde_json::from_str(
        r#"{
            "event_id": "evt-1",
            "work_item_id": "wi-1",
            "type": "resolved",
            "actor_id": "h1",
            "service": "api",
            "timestamp": "2026-07-01T12:00:00Z"
        }"#,
    )
    .unwrap();

    assert_eq!(outcome.kind, OutcomeType::Resolved);
    assert!(outcome.decision_id.is_none());
    assert!(outcome.new_assignee_id.is_none());
    assert!(outcome.original_assignee_id.is_none());
}

#[test]
fn reassigned_event_carries_the_optional_assignees() {
    let outcome: Outcome = serde_json::from_str(
        r#"{
            "event_id": "evt-2",
            "work_item_id": "wi-1",
            "decision_id": "dec-1",
            "type": "reassigned",
            "actor_id": "h2",
            "new_assignee_id": "h2",
            "service": "api",
            "timestamp": "2026-07-01T13:00:00Z"
        }"#,
    )
    .unwrap();

    assert_eq!(outcome.kind, OutcomeType::Reassigned);
    assert_eq!(outcome.decision_id.as_deref(), Some("dec-1"));
    assert_eq!(outcome.new_assignee_id.as_deref(), Some("h2"));
}

#[test]
fn outcome_types_are_a_closed_set() {
    let bad = serde_json::from_str::<Outcome>(
        r#"{
            "event_id": "evt-3",
            "work_item_id": "wi-1",
            "type": "snoozed",
            "actor_id": "h1",
            "service": "api",
            "timestamp": "2026-07-01T12:00:00Z"
        }"#,
    );
    assert!(bad.is_err());

    for kind in ["resolved", "reassigned", "escalated"] {
        assert!(kind.parse::<OutcomeType>().is_ok());
    }
}
