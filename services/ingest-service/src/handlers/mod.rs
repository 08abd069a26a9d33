pub mod webhooks;
pub mod work_items;

use actix_web::{get, web, HttpResponse, Responder};

#[get("/healthz")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "ingest"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(work_items::create)
        .service(work_items::list)
        .service(work_items::get)
        .service(work_items::record_outcome)
        .service(webhooks::incoming);
}
