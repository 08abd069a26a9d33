use crate::db;
use crate::services::creation::{create_work_item, CreateWorkItem};
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use routing_common::utils::generate_prefixed_id;
use routing_common::{AppError, Result};
use routing_models::{Outcome, OutcomeType, Severity, WorkItem, WorkItemType};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkItemRequest {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[validate(length(min = 1, message = "service must not be empty"))]
    pub service: String,
    pub severity: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    #[serde(default)]
    pub raw_log: Option<String>,
    #[serde(default = "default_origin_system")]
    pub origin_system: String,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub story_points: Option<i32>,
    #[serde(default)]
    pub impact: Option<String>,
}

fn default_kind() -> String {
    "incident".to_string()
}

fn default_origin_system() -> String {
    "api".to_string()
}

/// Create a work item and trigger routing.
#[post("/workitems")]
pub async fn create(
    state: web::Data<AppState>,
    request: web::Json<CreateWorkItemRequest>,
) -> Result<impl Responder> {
    let request = request.into_inner();
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let severity: Severity = request
        .severity
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("{}", e)))?;
    let kind: WorkItemType = request
        .kind
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("{}", e)))?;

    let work_item = create_work_item(
        state.get_ref(),
        CreateWorkItem {
            kind,
            service: request.service.trim().to_string(),
            severity,
            description: request.description,
            raw_log: request.raw_log,
            origin_system: request.origin_system,
            creator_id: request.creator_id,
            story_points: request.story_points,
            impact: request.impact,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(work_item))
}

#[get("/workitems/{work_item_id}")]
pub async fn get(
    state: web::Data<AppState>,
    work_item_id: web::Path<String>,
) -> Result<impl Responder> {
    let item = db::get_work_item(&state.pool, &work_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Work item {} not found", work_item_id)))?;
    Ok(HttpResponse::Ok().json(item))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub service: Option<String>,
    pub severity: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub work_items: Vec<WorkItem>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[get("/workitems")]
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let (work_items, total) = db::list_work_items(
        &state.pool,
        query.service.as_deref(),
        query.severity.as_deref(),
        limit,
        offset,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        work_items,
        total,
        limit,
        offset,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OutcomeRequest {
    pub event_id: String,
    #[serde(default)]
    pub decision_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub original_assignee_id: Option<String>,
    #[serde(default)]
    pub new_assignee_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutcomeAccepted {
    pub outcome_id: Option<String>,
    pub processed: bool,
    pub message: String,
}

/// Record an outcome and forward it to the Learner: the entry point of the
/// feedback edge. Idempotent per event_id.
#[post("/workitems/{work_item_id}/outcome")]
pub async fn record_outcome(
    state: web::Data<AppState>,
    work_item_id: web::Path<String>,
    request: web::Json<OutcomeRequest>,
) -> Result<impl Responder> {
    let request = request.into_inner();
    if request.event_id.trim().is_empty() {
        return Err(AppError::InvalidInput("event_id is required".to_string()));
    }
    let kind: OutcomeType = request
        .kind
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("{}", e)))?;

    let work_item = db::get_work_item(&state.pool, &work_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Work item {} not found", work_item_id)))?;

    let outcome = Outcome {
        event_id: request.event_id,
        work_item_id: work_item.id.clone(),
        decision_id: request.decision_id,
        kind,
        actor_id: request.actor_id,
        original_assignee_id: request.original_assignee_id,
        new_assignee_id: request.new_assignee_id,
        service: work_item.service,
        timestamp: request.timestamp,
    };

    let outcome_id = generate_prefixed_id("out");
    let inserted = db::insert_outcome_audit(&state.pool, &outcome_id, &outcome).await?;
    if !inserted {
        info!(event_id = %outcome.event_id, "outcome already recorded locally");
    }

    // The Learner applies its own exactly-once handling; a forwarding
    // failure is not a loss because the audit row is committed.
    match state.learner.forward_outcome(&outcome).await {
        Ok(()) => info!(event_id = %outcome.event_id, "outcome forwarded to learner"),
        Err(err) => warn!(event_id = %outcome.event_id, "failed to forward outcome: {}", err),
    }

    Ok(HttpResponse::Ok().json(OutcomeAccepted {
        outcome_id: inserted.then_some(outcome_id),
        processed: true,
        message: "Outcome recorded and forwarded to learner".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_fills_defaults() {
        let request: CreateWorkItemRequest = serde_json::from_str(
            r#"{"service": "api", "severity": "sev2", "description": "500 on /v1/users"}"#,
        )
        .unwrap();
        assert_eq!(request.kind, "incident");
        assert_eq!(request.origin_system, "api");
        assert!(request.raw_log.is_none());
        assert!(request.story_points.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_service_fails_validation() {
        let request: CreateWorkItemRequest = serde_json::from_str(
            r#"{"service": "", "severity": "sev2", "description": "x"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn unknown_severity_and_kind_are_rejected_by_parse() {
        assert!("sev5".parse::<Severity>().is_err());
        assert!("chore".parse::<WorkItemType>().is_err());
        assert!("incident".parse::<WorkItemType>().is_ok());
    }

    #[test]
    fn outcome_request_accepts_the_optional_fields() {
        let request: OutcomeRequest = serde_json::from_str(
            r#"{
                "event_id": "evt-1",
                "type": "reassigned",
                "actor_id": "h1",
                "new_assignee_id": "h2",
                "timestamp": "2026-07-01T12:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(request.kind, "reassigned");
        assert_eq!(request.new_assignee_id.as_deref(), Some("h2"));
        assert!(request.decision_id.is_none());
        assert!(request.original_assignee_id.is_none());
    }
}
