//! Wire-contract checks: the decision service produces these payloads, so
//! the request shape must keep accepting them, and the action record must
//! keep its exactly-one-of key/fallback shape on the wire.

use routing_models::{ExecuteDecisionRequest, ExecutedAction};
use sqlx::types::Json;

#[test]
fn request_from_the_decision_service_parses() {
    let request: ExecuteDecisionRequest = serde_json::from_str(
        r#"{
            "decision_id": "dec-1",
            "work_item_id": "wi-1",
            "primary_human_id": "h1",
            "backup_human_ids": ["h2"],
            "evidence": [
                {"type": "fit_score", "text": "Fit 0.85", "time_window": "current", "source": "Learner stats"}
            ],
            "work_item": {
                "service": "api",
                "severity": "sev2",
                "description": "500 on /v1/users",
                "story_points": 5
            }
        }"#,
    )
    .unwrap();

    assert_eq!(request.decision_id, "dec-1");
    assert_eq!(request.backup_human_ids, vec!["h2".to_string()]);
    assert_eq!(request.evidence.len(), 1);
    assert_eq!(request.work_item.story_points, Some(5));
}

#[test]
fn evidence_and_backups_default_to_empty() {
    let request: ExecuteDecisionRequest = serde_json::from_str(
        r#"{
            "decision_id": "dec-2",
            "work_item_id": "wi-2",
            "primary_human_id": "h1",
            "work_item": {
                "service": "api",
                "severity": "sev3",
                "description": "latency spike"
            }
        }"#,
    )
    .unwrap();

    assert!(request.backup_human_ids.is_empty());
    assert!(request.evidence.is_empty());
    assert!(request.work_item.story_points.is_none());
}

#[test]
fn executed_action_serializes_key_and_fallback_exclusively() {
    let created = ExecutedAction {
        id: "act-1".to_string(),
        decision_id: "dec-1".to_string(),
        tracker_issue_key: Some("API-1".to_string()),
        tracker_issue_id: Some("10001".to_string()),
        assigned_human_id: "h1".to_string(),
        backup_human_ids: Json(vec![]),
        created_at: chrono::Utc::now(),
        fallback_message: None,
    };
    let json = serde_json::to_value(&created).unwrap();
    assert_eq!(json["tracker_issue_key"], "API-1");
    assert_eq!(json["fallback_message"], serde_json::Value::Null);

    let fallback = ExecutedAction {
        tracker_issue_key: None,
        tracker_issue_id: None,
        fallback_message: Some("Tracker issue creation failed".to_string()),
        ..created
    };
    let json = serde_json::to_value(&fallback).unwrap();
    assert_eq!(json["tracker_issue_key"], serde_json::Value::Null);
    assert!(json["fallback_message"].as_str().unwrap().contains("failed"));
}
