use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use routing_common::adapters::tracker::HttpTracker;
use routing_common::adapters::AdapterConfig;
use routing_common::correlation::Correlation;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod handlers;
mod mappings;
mod render;
mod state;

use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    dotenv::dotenv().ok();
    let config = Config::from_env().expect("Failed to load configuration");

    info!("Starting execute-service on {}:{}", config.host, config.port);

    let pool = routing_database::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    routing_database::ensure_schema(&pool)
        .await
        .expect("Failed to ensure database schema");

    let tracker = Arc::new(
        HttpTracker::new(AdapterConfig {
            base_url: config.tracker_url.clone(),
            timeout_ms: 10_000,
            ..Default::default()
        })
        .expect("Failed to create tracker client"),
    );

    let state = AppState {
        pool,
        tracker,
        retry: AppState::retry_policy(&config),
        config: config.clone(),
    };

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Correlation)
            .wrap(Cors::permissive())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
