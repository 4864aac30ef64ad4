mod chat;
mod clients;
mod config;
mod context;
mod errors;
mod models;
mod routes;
mod state;
mod wines;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting wine BFF v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Backends: catalog={} search={} embeddings={} recs={} persist={} sommelier={}",
        config.catalog_service,
        config.search_service,
        config.embeddings_service,
        config.recs_service,
        config.persist_service,
        config.sommelier_service
    );

    let state = AppState::new(&config);

    // The browser calls us directly, hence the permissive CORS layer.
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
