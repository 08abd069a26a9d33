use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use routing_common::adapters::language_model::HttpLanguageModel;
use routing_common::adapters::vector_index::HttpVectorIndex;
use routing_common::adapters::AdapterConfig;
use routing_common::correlation::Correlation;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod clients;
mod config;
mod db;
mod engine;
mod handlers;
mod state;

use clients::{ExecuteClient, ExplainClient, LearnerClient};
use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    dotenv::dotenv().ok();
    let config = Config::from_env().expect("Failed to load configuration");

    info!("Starting decision-service on {}:{}", config.host, config.port);

    let pool = routing_database::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    routing_database::ensure_schema(&pool)
        .await
        .expect("Failed to ensure database schema");

    let language_model = Arc::new(
        HttpLanguageModel::new(
            AdapterConfig {
                base_url: config.language_model_url.clone(),
                ..Default::default()
            },
            config.embedding_dims,
        )
        .expect("Failed to create language model client"),
    );
    let vector_index = Arc::new(
        HttpVectorIndex::new(AdapterConfig {
            base_url: config.vector_index_url.clone(),
            timeout_ms: 5_000,
            ..Default::default()
        })
        .expect("Failed to create vector index client"),
    );

    let state = AppState {
        pool,
        language_model,
        vector_index,
        learner: Arc::new(LearnerClient::new(config.learner_service_url.clone())),
        explain: Arc::new(ExplainClient::new(config.explain_service_url.clone())),
        execute: Arc::new(ExecuteClient::new(config.execute_service_url.clone())),
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
