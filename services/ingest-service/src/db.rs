//! Ingest-owned persistence: work items and the local outcome audit rows.

use chrono::{DateTime, Utc};
use routing_common::Result;
use routing_models::{Outcome, WorkItem};
use sqlx::PgPool;

pub struct NewWorkItem {
    pub id: String,
    pub kind: String,
    pub service: String,
    pub severity: String,
    pub description: String,
    pub raw_log: Option<String>,
    pub embedding: Option<(f64, f64, f64)>,
    pub created_at: DateTime<Utc>,
    pub origin_system: String,
    pub creator_id: Option<String>,
    pub story_points: Option<i32>,
    pub impact: Option<String>,
}

pub async fn insert_work_item(pool: &PgPool, item: &NewWorkItem) -> Result<()> {
    let (x, y, z) = match item.embedding {
        Some((x, y, z)) => (Some(x), Some(y), Some(z)),
        None => (None, None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO work_items (
            id, type, service, severity, description, raw_log,
            embedding_x, embedding_y, embedding_z,
            created_at, origin_system, creator_id, story_points, impact
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(&item.id)
    .bind(&item.kind)
    .bind(&item.service)
    .bind(&item.severity)
    .bind(&item.description)
    .bind(&item.raw_log)
    .bind(x)
    .bind(y)
    .bind(z)
    .bind(item.created_at)
    .bind(&item.origin_system)
    .bind(&item.creator_id)
    .bind(item.story_points)
    .bind(&item.impact)
    .execute(pool)
    .await?;
    Ok(())
}

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

/// Filtered page of work items plus the total match count.
pub async fn list_work_items(
    pool: &PgPool,
    service: Option<&str>,
    severity: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<WorkItem>, i64)> {
    // Build the WHERE clause once and share it between count and page.
    let mut where_sql = String::from(" WHERE 1=1");
    let mut bind_index = 1;
    if service.is_some() {
        where_sql.push_str(&format!(" AND service = ${}", bind_index));
        bind_index += 1;
    }
    if severity.is_some() {
        where_sql.push_str(&format!(" AND severity = ${}", bind_index));
        bind_index += 1;
    }

    let count_sql = format!("SELECT COUNT(*) FROM work_items{}", where_sql);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    if let Some(service) = service {
        count_query = count_query.bind(service);
    }
    if let Some(severity) = severity {
        count_query = count_query.bind(severity);
    }
    let (total,) = count_query.fetch_one(pool).await?;

    let page_sql = format!(
        r#"
        SELECT id, type, service, severity, description, raw_log,
               embedding_x, embedding_y, embedding_z,
               created_at, origin_system, creator_id, tracker_issue_key,
               story_points, impact
        FROM work_items{}
        ORDER BY created_at DESC
        LIMIT ${} OFFSET ${}
        "#,
        where_sql,
        bind_index,
        bind_index + 1
    );
    let mut page_query = sqlx::query_as::<_, WorkItem>(&page_sql);
    if let Some(service) = service {
        page_query = page_query.bind(service);
    }
    if let Some(severity) = severity {
        page_query = page_query.bind(severity);
    }
    let items = page_query.bind(limit).bind(offset).fetch_all(pool).await?;

    Ok((items, total))
}

/// Local audit copy of an outcome. Idempotent on event_id; returns false on
/// replay.
pub async fn insert_outcome_audit(
    pool: &PgPool,
    outcome_id: &str,
    outcome: &Outcome,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO outcomes (
            id, event_id, work_item_id, decision_id, type, actor_id,
            new_assignee_id, service, occurred_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (event_id) DO NOTHING
        "#,
    )
    .bind(outcome_id)
    .bind(&outcome.event_id)
    .bind(&outcome.work_item_id)
    .bind(&outcome.decision_id)
    .bind(outcome.kind.as_str())
    .bind(&outcome.actor_id)
    .bind(&outcome.new_assignee_id)
    .bind(&outcome.service)
    .bind(outcome.timestamp)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
