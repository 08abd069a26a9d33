use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use routing_common::adapters::language_model::HttpLanguageModel;
use routing_common::adapters::AdapterConfig;
use routing_common::correlation::Correlation;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod evidence;
mod handlers;
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

    info!("Starting explain-service on {}:{}", config.host, config.port);

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

    let state = AppState {
        config: config.clone(),
        language_model,
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
