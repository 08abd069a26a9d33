//! Execute-owned persistence. The unique key on executed_actions.decision_id
//! makes execution at-most-once; conflicts are recovered into the existing
//! row.

use routing_common::Result;
use routing_models::ExecutedAction;
use sqlx::PgPool;
use tracing::{info, warn};

/// Returns the stored action: the new one when the insert won, or the
/// existing row when a concurrent execution got there first.
pub async fn insert_executed_action(
    pool: &PgPool,
    action: &ExecutedAction,
) -> Result<ExecutedAction> {
    let result = sqlx::query(
        r#"
        INSERT INTO executed_actions
            (id, decision_id, tracker_issue_key, tracker_issue_id,
             assigned_human_id, backup_human_ids, created_at, fallback_message)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (decision_id) DO NOTHING
        "#,
    )
    .bind(&action.id)
    .bind(&action.decision_id)
    .bind(&action.tracker_issue_key)
    .bind(&action.tracker_issue_id)
    .bind(&action.assigned_human_id)
    .bind(&action.backup_human_ids)
    .bind(action.created_at)
    .bind(&action.fallback_message)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!(action_id = %action.id, decision_id = %action.decision_id, "stored executed action");
        return Ok(action.clone());
    }

    let existing = get_by_decision(pool, &action.decision_id).await?;
    existing.ok_or_else(|| {
        routing_common::AppError::Internal(
            "executed action conflict without an existing row".to_string(),
        )
    })
}

pub async fn get_by_decision(pool: &PgPool, decision_id: &str) -> Result<Option<ExecutedAction>> {
    let action = sqlx::query_as::<_, ExecutedAction>(
        r#"
        SELECT id, decision_id, tracker_issue_key, tracker_issue_id,
               assigned_human_id, backup_human_ids, created_at, fallback_message
        FROM executed_actions
        WHERE decision_id = $1
        "#,
    )
    .bind(decision_id)
    .fetch_optional(pool)
    .await?;
    Ok(action)
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ExecutedAction>> {
    let actions = sqlx::query_as::<_, ExecutedAction>(
        r#"
        SELECT id, decision_id, tracker_issue_key, tracker_issue_id,
               assigned_human_id, backup_human_ids, created_at, fallback_message
        FROM executed_actions
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(actions)
}

/// Link the tracker issue back onto the work item. Best-effort: a failure
/// is logged and never rolls back the executed action.
pub async fn update_work_item_issue_key(pool: &PgPool, work_item_id: &str, issue_key: &str) {
    let result = sqlx::query("UPDATE work_items SET tracker_issue_key = $1 WHERE id = $2")
        .bind(issue_key)
        .bind(work_item_id)
        .execute(pool)
        .await;

    match result {
        Ok(_) => info!(%work_item_id, %issue_key, "linked tracker issue to work item"),
        Err(err) => warn!(%work_item_id, "failed to link tracker issue: {}", err),
    }
}
