//! Learner-owned persistence: humans, stats, load, knowledge-graph edges,
//! and the outcomes dedupe table. Outcome application runs on a transaction
//! so a partial failure leaves the event unprocessed and safely retryable.

use chrono::{DateTime, Duration, Utc};
use routing_common::Result;
use routing_models::{Human, HumanLoad, HumanServiceStats};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

/// One profile row joined with responder identity.
#[derive(Debug, Clone, FromRow)]
pub struct ServiceStatsRow {
    pub human_id: String,
    pub display_name: String,
    pub tracker_account_id: Option<String>,
    pub active: bool,
    pub fit_score: f64,
    pub resolves_count: i32,
    pub transfers_count: i32,
    pub last_resolved_at: Option<DateTime<Utc>>,
}

/// Resolved item joined with its description for embedding aggregation.
#[derive(Debug, Clone, FromRow)]
pub struct ResolvedItem {
    pub work_item_id: String,
    pub resolved_at: DateTime<Utc>,
    pub description: String,
}

pub async fn get_or_create_human(
    pool: &PgPool,
    human_id: &str,
    display_name: Option<&str>,
    tracker_account_id: Option<&str>,
) -> Result<Human> {
    let human = sqlx::query_as::<_, Human>(
        r#"
        INSERT INTO humans (id, display_name, tracker_account_id)
        VALUES ($1, COALESCE($2, $1), $3)
        ON CONFLICT (id) DO UPDATE
        SET display_name = COALESCE($2, humans.display_name),
            tracker_account_id = COALESCE($3, humans.tracker_account_id)
        RETURNING id, display_name, tracker_account_id, active, coord_x, coord_y, coord_z
        "#,
    )
    .bind(human_id)
    .bind(display_name)
    .bind(tracker_account_id)
    .fetch_one(pool)
    .await?;
    Ok(human)
}

pub async fn get_human(pool: &PgPool, human_id: &str) -> Result<Option<Human>> {
    let human = sqlx::query_as::<_, Human>(
        r#"
        SELECT id, display_name, tracker_account_id, active, coord_x, coord_y, coord_z
        FROM humans
        WHERE id = $1
        "#,
    )
    .bind(human_id)
    .fetch_optional(pool)
    .await?;
    Ok(human)
}

/// Stats for every human with activity in the service, restricted to the
/// recency window (rows that last resolved before the cutoff are dropped,
/// rows that never resolved are kept).
pub async fn service_stats(
    pool: &PgPool,
    service: &str,
    window_days: i64,
) -> Result<Vec<ServiceStatsRow>> {
    let cutoff = Utc::now() - Duration::days(window_days);
    let rows = sqlx::query_as::<_, ServiceStatsRow>(
        r#"
        SELECT hss.human_id, h.display_name, h.tracker_account_id, h.active,
               hss.fit_score, hss.resolves_count, hss.transfers_count, hss.last_resolved_at
        FROM human_service_stats hss
        JOIN humans h ON h.id = hss.human_id
        WHERE hss.service = $1
          AND (hss.last_resolved_at IS NULL OR hss.last_resolved_at >= $2)
        ORDER BY hss.fit_score DESC
        "#,
    )
    .bind(service)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn stats_for_human(pool: &PgPool, human_id: &str) -> Result<Vec<HumanServiceStats>> {
    let rows = sqlx::query_as::<_, HumanServiceStats>(
        r#"
        SELECT human_id, service, fit_score, resolves_count, transfers_count, last_resolved_at
        FROM human_service_stats
        WHERE human_id = $1
        ORDER BY fit_score DESC
        "#,
    )
    .bind(human_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_load(pool: &PgPool, human_id: &str) -> Result<HumanLoad> {
    let load = sqlx::query_as::<_, HumanLoad>(
        r#"
        SELECT human_id, pages_7d, active_items, last_updated
        FROM human_load
        WHERE human_id = $1
        "#,
    )
    .bind(human_id)
    .fetch_optional(pool)
    .await?;

    Ok(load.unwrap_or_else(|| HumanLoad {
        human_id: human_id.to_string(),
        pages_7d: 0,
        active_items: 0,
        last_updated: Utc::now(),
    }))
}

/// Most recent resolutions for one (human, service) pair. The capability
/// embedding is per pair, so resolutions in other services must not bleed in.
pub async fn resolved_work_items(
    pool: &PgPool,
    human_id: &str,
    service: &str,
    limit: i64,
) -> Result<Vec<ResolvedItem>> {
    let rows = sqlx::query_as::<_, ResolvedItem>(
        r#"
        SELECT re.work_item_id, re.resolved_at, wi.description
        FROM resolved_edges re
        JOIN work_items wi ON wi.id = re.work_item_id
        WHERE re.human_id = $1 AND wi.service = $2
        ORDER BY re.resolved_at DESC
        LIMIT $3
        "#,
    )
    .bind(human_id)
    .bind(service)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn update_human_coords(
    pool: &PgPool,
    human_id: &str,
    x: f64,
    y: f64,
    z: f64,
) -> Result<()> {
    sqlx::query("UPDATE humans SET coord_x = $1, coord_y = $2, coord_z = $3 WHERE id = $4")
        .bind(x)
        .bind(y)
        .bind(z)
        .bind(human_id)
        .execute(pool)
        .await?;
    Ok(())
}

// --- transactional outcome application -------------------------------------

pub async fn is_event_processed(
    tx: &mut Transaction<'_, Postgres>,
    event_id: &str,
) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT event_id FROM outcomes_dedupe WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(row.is_some())
}

pub async fn mark_event_processed(
    tx: &mut Transaction<'_, Postgres>,
    event_id: &str,
    processed_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO outcomes_dedupe (event_id, processed_at) VALUES ($1, $2)")
        .bind(event_id)
        .bind(processed_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn ensure_human_tx(
    tx: &mut Transaction<'_, Postgres>,
    human_id: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO humans (id, display_name) VALUES ($1, $1) ON CONFLICT (id) DO NOTHING",
    )
    .bind(human_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Resolution: clamped fit boost, resolve counter, last_resolved_at.
pub async fn apply_resolution(
    tx: &mut Transaction<'_, Postgres>,
    human_id: &str,
    service: &str,
    boost: f64,
    resolved_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO human_service_stats (human_id, service, fit_score, resolves_count, transfers_count, last_resolved_at)
        VALUES ($1, $2, LEAST(1.0, 0.5 + $3), 1, 0, $4)
        ON CONFLICT (human_id, service) DO UPDATE
        SET fit_score = GREATEST(0.0, LEAST(1.0, human_service_stats.fit_score + $3)),
            resolves_count = human_service_stats.resolves_count + 1,
            last_resolved_at = EXCLUDED.last_resolved_at
        "#,
    )
    .bind(human_id)
    .bind(service)
    .bind(boost)
    .bind(resolved_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Transfer away: clamped fit penalty plus transfer counter.
pub async fn apply_transfer_penalty(
    tx: &mut Transaction<'_, Postgres>,
    human_id: &str,
    service: &str,
    penalty: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO human_service_stats (human_id, service, fit_score, resolves_count, transfers_count)
        VALUES ($1, $2, GREATEST(0.0, 0.5 - $3), 0, 1)
        ON CONFLICT (human_id, service) DO UPDATE
        SET fit_score = GREATEST(0.0, LEAST(1.0, human_service_stats.fit_score - $3)),
            transfers_count = human_service_stats.transfers_count + 1
        "#,
    )
    .bind(human_id)
    .bind(service)
    .bind(penalty)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Acceptance: small clamped fit boost, no counter change.
pub async fn apply_accept_boost(
    tx: &mut Transaction<'_, Postgres>,
    human_id: &str,
    service: &str,
    boost: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO human_service_stats (human_id, service, fit_score, resolves_count, transfers_count)
        VALUES ($1, $2, LEAST(1.0, 0.5 + $3), 0, 0)
        ON CONFLICT (human_id, service) DO UPDATE
        SET fit_score = GREATEST(0.0, LEAST(1.0, human_service_stats.fit_score + $3))
        "#,
    )
    .bind(human_id)
    .bind(service)
    .bind(boost)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn fit_score_tx(
    tx: &mut Transaction<'_, Postgres>,
    human_id: &str,
    service: &str,
) -> Result<f64> {
    let row: Option<(f64,)> = sqlx::query_as(
        "SELECT fit_score FROM human_service_stats WHERE human_id = $1 AND service = $2",
    )
    .bind(human_id)
    .bind(service)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.map(|(fit,)| fit).unwrap_or(0.5))
}

/// Append-only; returns false when the edge already existed.
pub async fn insert_resolved_edge(
    tx: &mut Transaction<'_, Postgres>,
    human_id: &str,
    work_item_id: &str,
    resolved_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO resolved_edges (human_id, work_item_id, resolved_at)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(human_id)
    .bind(work_item_id)
    .bind(resolved_at)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_transferred_edge(
    tx: &mut Transaction<'_, Postgres>,
    work_item_id: &str,
    from_human_id: &str,
    to_human_id: &str,
    transferred_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transferred_edges (work_item_id, from_human_id, to_human_id, transferred_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(work_item_id)
    .bind(from_human_id)
    .bind(to_human_id)
    .bind(transferred_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn decrement_active_items(
    tx: &mut Transaction<'_, Postgres>,
    human_id: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO human_load (human_id, pages_7d, active_items, last_updated)
        VALUES ($1, 0, 0, NOW())
        ON CONFLICT (human_id) DO UPDATE
        SET active_items = GREATEST(0, human_load.active_items - 1),
            last_updated = NOW()
        "#,
    )
    .bind(human_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
