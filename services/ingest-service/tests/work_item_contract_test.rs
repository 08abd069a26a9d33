//! Wire-contract checks for the work-item shape this service serves: the
//! embedding coordinates are all-or-nothing and `type` is the external name
//! of the kind field.

use routing_models::WorkItem;

fn work_item(embedding: Option<(f64, f64, f64)>) -> WorkItem {
    WorkItem {
        id: "wi-1".to_string(),
        kind: "incident".to_string(),
        service: "api".to_string(),
        severity: "sev2".to_string(),
        description: "500 on /v1/users".to_string(),
        raw_log: None,
        embedding_x: embedding.map(|e| e.0),
        embedding_y: embedding.map(|e| e.1),
        embedding_z: embedding.map(|e| e.2),
        created_at: chrono::Utc::now(),
        origin_system: "api".to_string(),
        creator_id: None,
        tracker_issue_key: None,
        story_points: Some(3),
        impact: None,
    }
}

#[test]
fn kind_serializes_under_the_type_key() {
    let json = serde_json::to_value(work_item(None)).unwrap();
    assert_eq!(json["type"], "incident");
    assert!(json.get("kind").is_none());

    let parsed: WorkItem = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.kind, "incident");
}

#[test]
fn embedding_coordinates_are_all_or_nothing() {
    let with = serde_json::to_value(work_item(Some((0.1, -0.2, 0.3)))).unwrap();
    assert!(with["embedding_x"].is_f64());
    assert!(with["embedding_y"].is_f64());
    assert!(with["embedding_z"].is_f64());

    let without = serde_json::to_value(work_item(None)).unwrap();
    assert!(without["embedding_x"].is_null());
    assert!(without["embedding_y"].is_null());
    assert!(without["embedding_z"].is_null());
}
