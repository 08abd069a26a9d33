//! Wire-contract checks for the audit records this service persists and
//! serves. Downstream consumers (the learner's read-only lookup, operator
//! tooling) parse these exact field names.

use routing_models::{Decision, DecisionCandidate, ScoreBreakdown};
use sqlx::types::Json;

#[test]
fn decision_serializes_backups_as_a_plain_array() {
    let decision = Decision {
        id: "dec-1".to_string(),
        work_item_id: "wi-1".to_string(),
        primary_human_id: "h1".to_string(),
        backup_human_ids: Json(vec!["h2".to_string(), "h3".to_string()]),
        confidence: 0.83,
        created_at: chrono::Utc::now(),
    };

    let json = serde_json::to_value(&decision).unwrap();
    assert_eq!(json["primary_human_id"], "h1");
    assert_eq!(json["backup_human_ids"], serde_json::json!(["h2", "h3"]));
    assert!(json["confidence"].as_f64().unwrap() <= 1.0);
}

#[test]
fn candidate_rows_carry_breakdown_or_filter_reason() {
    let survivor = DecisionCandidate {
        decision_id: "dec-1".to_string(),
        human_id: "h1".to_string(),
        score: 0.78,
        rank: 1,
        filtered: false,
        filter_reason: None,
        score_breakdown: Some(Json(ScoreBreakdown {
            fit_score: 0.85,
            severity_match: 1.085,
            capacity: 1.0,
            vector_similarity: 0.5,
            final_score: 0.78,
        })),
    };
    let json = serde_json::to_value(&survivor).unwrap();
    assert_eq!(json["rank"], 1);
    assert_eq!(json["score_breakdown"]["fit_score"], 0.85);
    assert_eq!(json["filter_reason"], serde_json::Value::Null);

    let filtered = DecisionCandidate {
        decision_id: "dec-1".to_string(),
        human_id: "h2".to_string(),
        score: 0.0,
        rank: 2,
        filtered: true,
        filter_reason: Some("Insufficient capacity: 6/21 available, need 10".to_string()),
        score_breakdown: None,
    };
    let json = serde_json::to_value(&filtered).unwrap();
    assert_eq!(json["score"], 0.0);
    assert!(json["filter_reason"].as_str().unwrap().contains("capacity"));
}

#[test]
fn decision_round_trips_through_json() {
    let decision = Decision {
        id: "dec-9".to_string(),
        work_item_id: "wi-9".to_string(),
        primary_human_id: "h1".to_string(),
        backup_human_ids: Json(vec![]),
        confidence: 0.4,
        created_at: chrono::Utc::now(),
    };
    let text = serde_json::to_string(&decision).unwrap();
    let parsed: Decision = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.id, decision.id);
    assert!(parsed.backup_human_ids.0.is_empty());
}
