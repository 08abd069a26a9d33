//! Decision-owned persistence: decisions, candidate audit rows, constraint
//! results. The unique key on decisions.work_item_id is the exactly-once
//! guarantee; conflicts are recovered into reads by the engine.

use routing_common::Result;
use routing_models::{ConstraintCheck, ConstraintResult, Decision, DecisionCandidate, WorkItem};
use sqlx::{PgPool, Postgres, Transaction};

pub async fn get_work_item(pool: &PgPool, work_item_id: &str) -> Result<Option<WorkItem>> {
    let item = sqlx::query_as::<_, WorkItem>(
        r#"
        SELECT id, type, service, severity, description, raw_log,
               embedding_x, embedding_y, embedding_z,
               created_at, origin_system, creator_id, tracker_issue_key,
               story_points, impact
        FROM work_items
        WHERE id = $1
        "#,
    )
    .bind(work_item_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

pub async fn get_decision_by_work_item(
    pool: &PgPool,
    work_item_id: &str,
) -> Result<Option<Decision>> {
    let decision = sqlx::query_as::<_, Decision>(
        r#"
        SELECT id, work_item_id, primary_human_id, backup_human_ids, confidence, created_at
        FROM decisions
        WHERE work_item_id = $1
        "#,
    )
    .bind(work_item_id)
    .fetch_optional(pool)
    .await?;
    Ok(decision)
}

pub async fn get_decision_candidates(
    pool: &PgPool,
    decision_id: &str,
) -> Result<Vec<DecisionCandidate>> {
    let candidates = sqlx::query_as::<_, DecisionCandidate>(
        r#"
        SELECT decision_id, human_id, score, rank, filtered, filter_reason, score_breakdown
        FROM decision_candidates
        WHERE decision_id = $1
        ORDER BY rank
        "#,
    )
    .bind(decision_id)
    .fetch_all(pool)
    .await?;
    Ok(candidates)
}

pub async fn get_constraint_results(
    pool: &PgPool,
    decision_id: &str,
) -> Result<Vec<ConstraintResult>> {
    let results = sqlx::query_as::<_, ConstraintResult>(
        r#"
        SELECT decision_id, constraint_name, passed, reason
        FROM constraint_results
        WHERE decision_id = $1
        ORDER BY constraint_name
        "#,
    )
    .bind(decision_id)
    .fetch_all(pool)
    .await?;
    Ok(results)
}

/// Returns false when another decision for the work item already exists;
/// the caller then reads and returns that one.
pub async fn insert_decision(
    tx: &mut Transaction<'_, Postgres>,
    decision: &Decision,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO decisions (id, work_item_id, primary_human_id, backup_human_ids, confidence, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (work_item_id) DO NOTHING
        "#,
    )
    .bind(&decision.id)
    .bind(&decision.work_item_id)
    .bind(&decision.primary_human_id)
    .bind(&decision.backup_human_ids)
    .bind(decision.confidence)
    .bind(decision.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_candidate(
    tx: &mut Transaction<'_, Postgres>,
    candidate: &DecisionCandidate,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO decision_candidates
            (decision_id, human_id, score, rank, filtered, filter_reason, score_breakdown)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (decision_id, human_id) DO NOTHING
        "#,
    )
    .bind(&candidate.decision_id)
    .bind(&candidate.human_id)
    .bind(candidate.score)
    .bind(candidate.rank)
    .bind(candidate.filtered)
    .bind(&candidate.filter_reason)
    .bind(&candidate.score_breakdown)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_constraint_result(
    tx: &mut Transaction<'_, Postgres>,
    decision_id: &str,
    check: &ConstraintCheck,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO constraint_results (decision_id, constraint_name, passed, reason)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (decision_id, constraint_name) DO NOTHING
        "#,
    )
    .bind(decision_id)
    .bind(&check.name)
    .bind(check.passed)
    .bind(&check.reason)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Humans who resolved work items for the service: the degraded candidate
/// source when the Learner is unreachable.
pub async fn humans_for_service(pool: &PgPool, service: &str, limit: i64) -> Result<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT DISTINCT h.id, h.display_name
        FROM humans h
        JOIN resolved_edges re ON re.human_id = h.id
        JOIN work_items wi ON wi.id = re.work_item_id
        WHERE h.active = TRUE AND wi.service = $1
        LIMIT $2
        "#,
    )
    .bind(service)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn any_active_humans(pool: &PgPool, limit: i64) -> Result<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, display_name FROM humans WHERE active = TRUE ORDER BY id LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
