use crate::db;
use crate::mappings;
use crate::render;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use routing_common::retry::RetryClass;
use routing_common::utils::generate_prefixed_id;
use routing_common::{AppError, Result};
use routing_models::{ExecuteDecisionRequest, ExecuteDecisionResponse};
use serde::Deserialize;
use sqlx::types::Json;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct ExecutedActionsQuery {
    pub decision_id: Option<String>,
}

/// Make a decision actionable: create the tracker ticket, or durably record
/// the rendered fallback when the tracker stays down. At most one executed
/// action exists per decision.
#[post("/execute")]
pub async fn execute_decision(
    state: web::Data<AppState>,
    request: web::Json<ExecuteDecisionRequest>,
) -> Result<impl Responder> {
    let request = request.into_inner();

    // Idempotent replay: a decision that was already executed returns the
    // stored action unchanged.
    if let Some(existing) = db::get_by_decision(&state.pool, &request.decision_id).await? {
        info!(decision_id = %request.decision_id, "decision already executed, returning existing");
        return Ok(HttpResponse::Ok().json(to_response(
            &existing,
            "Decision already executed".to_string(),
        )));
    }

    // Fail fast when any mapping cannot resolve; nothing is persisted yet.
    let project = mappings::tracker_project(&request.work_item.service);
    let priority = mappings::tracker_priority(&request.work_item.severity)?;
    let account_id = mappings::tracker_account_id(&state.pool, &request.primary_human_id).await?;

    info!(
        decision_id = %request.decision_id,
        %project, %priority, %account_id,
        "mappings validated"
    );

    let issue = routing_common::adapters::tracker::NewTrackerIssue {
        project,
        summary: render::issue_summary(&request.work_item.description),
        description: render::issue_description(&request),
        issue_type: state.config.issue_type.clone(),
        priority,
        assignee_account_id: account_id,
        story_points: request.work_item.story_points.filter(|p| *p > 0),
    };

    let created = create_with_retry(state.tracker.clone(), &state.retry, issue).await;

    let action_id = generate_prefixed_id("act");
    match created {
        Ok(created_issue) => {
            let action = routing_models::ExecutedAction {
                id: action_id,
                decision_id: request.decision_id.clone(),
                tracker_issue_key: Some(created_issue.key.clone()),
                tracker_issue_id: Some(created_issue.id),
                assigned_human_id: request.primary_human_id.clone(),
                backup_human_ids: Json(request.backup_human_ids.clone()),
                created_at: Utc::now(),
                fallback_message: None,
            };
            let stored = db::insert_executed_action(&state.pool, &action).await?;

            if let Some(key) = &stored.tracker_issue_key {
                db::update_work_item_issue_key(&state.pool, &request.work_item_id, key).await;
            }

            info!(
                decision_id = %request.decision_id,
                issue_key = %created_issue.key,
                "tracker issue created"
            );
            Ok(HttpResponse::Ok().json(to_response(
                &stored,
                "Tracker issue created successfully".to_string(),
            )))
        }
        Err(err) => {
            // The forward path is never lost: persist the rendered text so an
            // operator can act from the database alone.
            warn!(
                decision_id = %request.decision_id,
                "tracker unavailable ({}), storing fallback",
                err
            );
            let action = routing_models::ExecutedAction {
                id: action_id,
                decision_id: request.decision_id.clone(),
                tracker_issue_key: None,
                tracker_issue_id: None,
                assigned_human_id: request.primary_human_id.clone(),
                backup_human_ids: Json(request.backup_human_ids.clone()),
                created_at: Utc::now(),
                fallback_message: Some(render::fallback_message(&request)),
            };
            let stored = db::insert_executed_action(&state.pool, &action).await?;
            Ok(HttpResponse::Ok().json(to_response(
                &stored,
                "Tracker issue creation failed, stored fallback".to_string(),
            )))
        }
    }
}

#[get("/executed_actions")]
pub async fn list_executed_actions(
    state: web::Data<AppState>,
    query: web::Query<ExecutedActionsQuery>,
) -> Result<impl Responder> {
    let actions = match &query.decision_id {
        Some(decision_id) => db::get_by_decision(&state.pool, decision_id)
            .await?
            .into_iter()
            .collect(),
        None => db::list_recent(&state.pool, 100).await?,
    };
    Ok(HttpResponse::Ok().json(actions))
}

/// Creation with bounded retry. Transport failures and 5xx/429 retry with
/// backoff; other 4xx abort immediately.
async fn create_with_retry(
    tracker: std::sync::Arc<dyn routing_common::adapters::tracker::Tracker>,
    retry: &routing_common::retry::RetryPolicy,
    issue: routing_common::adapters::tracker::NewTrackerIssue,
) -> Result<routing_common::adapters::tracker::CreatedIssue> {
    retry
        .run(|_attempt| {
            let issue = issue.clone();
            let tracker = tracker.clone();
            async move {
                tracker.create_issue(issue).await.map_err(|err| match err {
                    AppError::DependencyUnavailable(_) => RetryClass::Retryable(err),
                    other => RetryClass::Fatal(other),
                })
            }
        })
        .await
}

fn to_response(action: &routing_models::ExecutedAction, message: String) -> ExecuteDecisionResponse {
    ExecuteDecisionResponse {
        executed_action_id: action.id.clone(),
        tracker_issue_key: action.tracker_issue_key.clone(),
        tracker_issue_id: action.tracker_issue_id.clone(),
        assigned_human_id: action.assigned_human_id.clone(),
        created_at: action.created_at.to_rfc3339(),
        message,
        fallback_used: action.fallback_message.is_some(),
    }
}
