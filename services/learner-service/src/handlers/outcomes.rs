use crate::services::outcomes::process_outcome;
use crate::state::AppState;
use actix_web::{post, web, HttpResponse, Responder};
use routing_common::Result;
use routing_models::Outcome;

/// Apply one outcome event. Idempotent per event_id: a replay reports
/// processed=false and changes nothing.
#[post("/outcomes")]
pub async fn post_outcome(
    state: web::Data<AppState>,
    outcome: web::Json<Outcome>,
) -> Result<impl Responder> {
    let report = process_outcome(state.get_ref(), outcome.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}
