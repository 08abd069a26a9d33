pub mod explain;

use actix_web::{get, web, HttpResponse, Responder};

#[get("/healthz")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "explain"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(explain::explain_decision);
}
