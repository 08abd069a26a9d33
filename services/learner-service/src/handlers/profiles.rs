use crate::db;
use crate::services::stats::{fit_score, FitParams};
use crate::state::AppState;
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use routing_common::adapters::tracker::StoryPointCapacity;
use routing_common::{AppError, Result};
use routing_models::CandidateProfile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct ProfilesQuery {
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct ProfilesResponse {
    pub service: String,
    pub humans: Vec<CandidateProfile>,
}

/// Human profiles for a service: decayed fit, counters, load, and tracker
/// capacity signals, sorted best-fit first.
#[get("/profiles")]
pub async fn get_profiles(
    state: web::Data<AppState>,
    query: web::Query<ProfilesQuery>,
) -> Result<impl Responder> {
    let service = query.service.trim();
    if service.is_empty() {
        return Err(AppError::InvalidInput(
            "service parameter is required".to_string(),
        ));
    }

    let fit_params = FitParams {
        recency_window_days: state.config.recency_window_days,
        daily_decay: state.config.daily_decay,
    };
    let now = Utc::now();

    let rows = db::service_stats(&state.pool, service, state.config.recency_window_days).await?;

    let mut humans = Vec::with_capacity(rows.len());
    for row in rows {
        let load = db::get_load(&state.pool, &row.human_id).await?;
        let fit = fit_score(
            row.resolves_count,
            row.transfers_count,
            row.last_resolved_at,
            now,
            fit_params,
        );

        // Tracker signals degrade to defaults when the tracker is down;
        // profiles must stay servable for the decision path.
        let mut capacity = StoryPointCapacity::default();
        let mut on_call = false;
        let mut resolved_by_severity: HashMap<String, i64> = HashMap::new();
        if let Some(account_id) = &row.tracker_account_id {
            match state.tracker.user_story_points(account_id).await {
                Ok(points) => capacity = points,
                Err(err) => warn!(human_id = %row.human_id, "story point lookup failed: {}", err),
            }
            match state.tracker.user_on_call(account_id).await {
                Ok(value) => on_call = value,
                Err(err) => warn!(human_id = %row.human_id, "on-call lookup failed: {}", err),
            }
            match state
                .tracker
                .user_resolved_by_severity(
                    account_id,
                    service,
                    state.config.recency_window_days as u32,
                )
                .await
            {
                Ok(map) => resolved_by_severity = map,
                Err(err) => {
                    warn!(human_id = %row.human_id, "severity breakdown lookup failed: {}", err)
                }
            }
        }

        humans.push(CandidateProfile {
            human_id: row.human_id,
            display_name: row.display_name,
            fit_score: fit,
            resolves_count: row.resolves_count,
            transfers_count: row.transfers_count,
            last_resolved_at: row.last_resolved_at,
            active: row.active,
            on_call,
            pages_7d: load.pages_7d,
            active_items: load.active_items,
            max_story_points: capacity.max_story_points,
            current_story_points: capacity.current_story_points,
            resolved_by_severity,
        });
    }

    // fit descending, id ascending so equal scores order deterministically.
    humans.sort_by(|a, b| {
        b.fit_score
            .partial_cmp(&a.fit_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.human_id.cmp(&b.human_id))
    });

    Ok(HttpResponse::Ok().json(ProfilesResponse {
        service: service.to_string(),
        humans,
    }))
}
