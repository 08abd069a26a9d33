pub mod outcomes;
pub mod profiles;
pub mod stats;
pub mod sync;

use actix_web::{get, web, HttpResponse, Responder};

#[get("/healthz")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "learner"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(profiles::get_profiles)
        .service(stats::get_stats)
        .service(outcomes::post_outcome)
        .service(sync::sync_closed);
}
