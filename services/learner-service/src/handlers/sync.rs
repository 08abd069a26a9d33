use crate::db;
use crate::state::AppState;
use actix_web::{post, web, HttpResponse, Responder};
use routing_common::adapters::tracker::{QueryField, TrackerIssue, TrackerQuery};
use routing_common::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

const PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct SyncClosedRequest {
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    #[serde(default)]
    pub project: Option<String>,
}

fn default_days_back() -> u32 {
    90
}

#[derive(Debug, Serialize)]
pub struct SyncClosedResponse {
    pub synced: usize,
    pub humans_updated: usize,
    pub message: String,
}

/// Bootstrap capability stats from the tracker's closed issues. Idempotent:
/// each issue is keyed by its ResolvedEdge, so re-running a sync only applies
/// items not seen before.
#[post("/sync/closed")]
pub async fn sync_closed(
    state: web::Data<AppState>,
    request: web::Json<SyncClosedRequest>,
) -> Result<impl Responder> {
    let mut query = TrackerQuery::new()
        .eq(QueryField::Status, "Done")
        .resolved_within_days(request.days_back);
    if let Some(project) = &request.project {
        query = query.eq(QueryField::Project, project.clone());
    }

    let mut synced = 0usize;
    let mut humans_updated: HashSet<String> = HashSet::new();
    let mut start_at = 0i64;

    loop {
        let page = state.tracker.search_issues(&query, start_at, PAGE_SIZE).await?;
        if page.issues.is_empty() {
            break;
        }
        let fetched = page.issues.len() as i64;

        for issue in page.issues {
            match sync_issue(&state, &issue).await {
                Ok(true) => {
                    synced += 1;
                    if let Some(account_id) = issue.assignee_account_id {
                        humans_updated.insert(account_id);
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(issue_key = %issue.key, "failed to sync issue: {}", err);
                }
            }
        }

        start_at += fetched;
        if start_at >= page.total {
            break;
        }
    }

    info!(synced, humans = humans_updated.len(), "closed-issue sync completed");

    Ok(HttpResponse::Ok().json(SyncClosedResponse {
        synced,
        humans_updated: humans_updated.len(),
        message: "Sync completed successfully".to_string(),
    }))
}

/// Returns true when the issue produced a new resolution.
async fn sync_issue(state: &AppState, issue: &TrackerIssue) -> Result<bool> {
    let (Some(account_id), Some(resolved_at)) =
        (issue.assignee_account_id.as_deref(), issue.resolution_date)
    else {
        return Ok(false);
    };
    if issue.project.is_empty() {
        return Ok(false);
    }

    let display_name = issue.assignee_display_name.as_deref();
    db::get_or_create_human(&state.pool, account_id, display_name, Some(account_id)).await?;

    // Tracker projects are uppercase service tags.
    let service = issue.project.to_lowercase();

    let mut tx = state.pool.begin().await?;
    let inserted = db::insert_resolved_edge(&mut tx, account_id, &issue.key, resolved_at).await?;
    if !inserted {
        tx.rollback().await?;
        return Ok(false);
    }
    // Bootstrap counts history without inflating fit: deltas come only from
    // live outcomes.
    db::apply_resolution(&mut tx, account_id, &service, 0.0, resolved_at).await?;
    tx.commit().await?;
    Ok(true)
}
