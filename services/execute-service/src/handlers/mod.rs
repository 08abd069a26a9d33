pub mod execute;

use actix_web::{get, web, HttpResponse, Responder};

#[get("/healthz")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "execute"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(execute::execute_decision)
        .service(execute::list_executed_actions);
}
