//! Candidate sourcing. The Learner is authoritative; when it is unreachable
//! the engine degrades to neutral profiles built from humans who have worked
//! on the service, so a Learner outage never blocks routing on its own.

use crate::db;
use crate::state::AppState;
use routing_common::Result;
use routing_models::CandidateProfile;
use tracing::warn;

const FALLBACK_LIMIT: i64 = 20;

pub async fn fetch_candidates(state: &AppState, service: &str) -> Result<Vec<CandidateProfile>> {
    match state.learner.get_profiles(service).await {
        Ok(profiles) if !profiles.is_empty() => return Ok(profiles),
        Ok(_) => {
            warn!(%service, "learner returned no profiles, using fallback candidates");
        }
        Err(err) => {
            warn!(%service, "learner unavailable ({}), using fallback candidates", err);
        }
    }
    fallback_candidates(state, service).await
}

async fn fallback_candidates(state: &AppState, service: &str) -> Result<Vec<CandidateProfile>> {
    let mut rows = db::humans_for_service(&state.pool, service, FALLBACK_LIMIT).await?;
    if rows.is_empty() {
        rows = db::any_active_humans(&state.pool, FALLBACK_LIMIT).await?;
    }

    Ok(rows
        .into_iter()
        .map(|(id, display_name)| CandidateProfile::neutral(id, display_name))
        .collect())
}
