use crate::db;
use crate::state::AppState;
use actix_web::{get, web, HttpResponse, Responder};
use routing_common::{AppError, Result};
use routing_models::{HumanLoad, HumanServiceStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub human_id: String,
}

#[derive(Debug, Serialize)]
pub struct HumanStatsResponse {
    pub human_id: String,
    pub display_name: String,
    pub tracker_account_id: Option<String>,
    pub service_stats: Vec<HumanServiceStats>,
    pub load: HumanLoad,
}

/// Aggregate view of one human across services, plus load.
#[get("/stats")]
pub async fn get_stats(
    state: web::Data<AppState>,
    query: web::Query<StatsQuery>,
) -> Result<impl Responder> {
    let human_id = query.human_id.trim();
    if human_id.is_empty() {
        return Err(AppError::InvalidInput(
            "human_id parameter is required".to_string(),
        ));
    }

    let human = db::get_human(&state.pool, human_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Human {} not found", human_id)))?;

    let service_stats = db::stats_for_human(&state.pool, human_id).await?;
    let load = db::get_load(&state.pool, human_id).await?;

    Ok(HttpResponse::Ok().json(HumanStatsResponse {
        human_id: human.id,
        display_name: human.display_name,
        tracker_account_id: human.tracker_account_id,
        service_stats,
        load,
    }))
}
