pub mod decisions;

use actix_web::{get, web, HttpResponse, Responder};

#[get("/healthz")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "decision"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(decisions::decide)
        .service(decisions::get_decision)
        .service(decisions::get_audit);
}
