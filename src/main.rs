// define modules in crate
mod config;
mod domain;
mod dtos;
mod errors;
mod repositories;
mod routes;
mod service;
mod state;

use std::{error::Error, sync::{Arc, Mutex}};

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use config::{AppConfig, StoreKind};
use dotenv::dotenv;
use mongodb::Client;
use repositories::{InMemoryProductRepository, MongoDbProductRepository, ProductStore};
use service::ProductService;
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{event, Level};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let config = AppConfig::from_env()?;

    let writer = match &config.log_path {
        Some(path) => BoxMakeWriter::new(Mutex::new(std::fs::File::create(path)?)),
        None => BoxMakeWriter::new(std::io::stdout),
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false)
        .with_ansi(false)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_writer(writer)
        .init();

    let product_store: Arc<dyn ProductStore> = match &config.store {
        StoreKind::MongoDb(info) => {
            let client = Client::with_uri_str(&info.uri).await?;
            Arc::new(MongoDbProductRepository::new(info, &client).await?)
        }
        StoreKind::InMemory => {
            event!(Level::WARN, "Using the in-memory product store; data is lost on restart");
            Arc::new(InMemoryProductRepository::new())
        }
    };

    let state = Arc::new(AppState {
        product_service: Arc::new(ProductService::new(product_store)),
    });

    let (prometheus_layer, metrics_handle) = PrometheusMetricLayer::pair();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    event!(Level::INFO, "Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        routes::router(state)
            .route("/metrics", get(|| async move { metrics_handle.render() }))
            .layer(prometheus_layer)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            ),
    )
    .await?;

    Ok(())
}
