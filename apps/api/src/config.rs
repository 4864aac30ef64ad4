use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Base URLs default to the local dev ports of each backend service.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_service: String,
    pub search_service: String,
    pub embeddings_service: String,
    pub recs_service: String,
    pub persist_service: String,
    pub sommelier_service: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            catalog_service: env_or("CATALOG_SERVICE", "http://localhost:8001"),
            search_service: env_or("SEARCH_SERVICE", "http://localhost:8002"),
            embeddings_service: env_or("EMBEDDINGS_SERVICE", "http://localhost:8003"),
            persist_service: env_or("PERSIST_SERVICE", "http://localhost:8004"),
            recs_service: env_or("RECS_SERVICE", "http://localhost:8005"),
            sommelier_service: env_or("SOMMELIER_SERVICE", "http://localhost:8006"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
