use crate::db;
use crate::engine;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use routing_common::{AppError, Result};
use routing_models::{ConstraintCheck, Decision, DecisionCandidate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub work_item_id: String,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub id: String,
    pub work_item_id: String,
    pub primary_human_id: String,
    pub backup_human_ids: Vec<String>,
    pub confidence: f64,
    pub constraints_checked: Vec<ConstraintCheck>,
    pub created_at: DateTime<Utc>,
}

impl DecisionResponse {
    fn from_decision(decision: Decision, constraints: Vec<ConstraintCheck>) -> Self {
        Self {
            id: decision.id,
            work_item_id: decision.work_item_id,
            primary_human_id: decision.primary_human_id,
            backup_human_ids: decision.backup_human_ids.0,
            confidence: decision.confidence,
            constraints_checked: constraints,
            created_at: decision.created_at,
        }
    }
}

/// Produce (or replay) the decision for a work item.
#[post("/decide")]
pub async fn decide(
    state: web::Data<AppState>,
    request: web::Json<DecideRequest>,
) -> Result<impl Responder> {
    let work_item_id = request.work_item_id.trim();
    if work_item_id.is_empty() {
        return Err(AppError::InvalidInput(
            "work_item_id is required".to_string(),
        ));
    }

    let outcome = engine::decide(state.get_ref(), work_item_id).await?;
    Ok(HttpResponse::Ok().json(DecisionResponse::from_decision(
        outcome.decision,
        outcome.constraints,
    )))
}

#[get("/decisions/{work_item_id}")]
pub async fn get_decision(
    state: web::Data<AppState>,
    work_item_id: web::Path<String>,
) -> Result<impl Responder> {
    let decision = db::get_decision_by_work_item(&state.pool, &work_item_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Decision not found for work_item {}", work_item_id))
        })?;

    let constraints = db::get_constraint_results(&state.pool, &decision.id)
        .await?
        .into_iter()
        .map(|r| ConstraintCheck {
            name: r.constraint_name,
            passed: r.passed,
            reason: r.reason,
        })
        .collect();

    Ok(HttpResponse::Ok().json(DecisionResponse::from_decision(decision, constraints)))
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub work_item_id: String,
    pub decision_id: String,
    pub decision: DecisionResponse,
    pub candidates: Vec<DecisionCandidate>,
    pub constraints: Vec<ConstraintCheck>,
}

/// Full audit trail: every considered candidate with scores or filter
/// reasons, plus the constraint results.
#[get("/audit/{work_item_id}")]
pub async fn get_audit(
    state: web::Data<AppState>,
    work_item_id: web::Path<String>,
) -> Result<impl Responder> {
    let decision = db::get_decision_by_work_item(&state.pool, &work_item_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Decision not found for work_item {}", work_item_id))
        })?;

    let candidates = db::get_decision_candidates(&state.pool, &decision.id).await?;
    let constraints: Vec<ConstraintCheck> = db::get_constraint_results(&state.pool, &decision.id)
        .await?
        .into_iter()
        .map(|r| ConstraintCheck {
            name: r.constraint_name,
            passed: r.passed,
            reason: r.reason,
        })
        .collect();

    let decision_id = decision.id.clone();
    Ok(HttpResponse::Ok().json(AuditResponse {
        work_item_id: work_item_id.into_inner(),
        decision_id,
        decision: DecisionResponse::from_decision(decision, constraints.clone()),
        candidates,
        constraints,
    }))
}
