use reqwest::Client;

use crate::clients::{
    CatalogClient, EmbeddingsClient, HttpClient, PersistClient, RecsClient, SearchClient,
    SommelierClient,
};
use crate::config::Config;
use crate::wines::orchestrator::Aggregator;

/// Shared application state injected into all route handlers via Axum
/// extractors. Clients are built once at startup from config base URLs and
/// are the only mutable-free state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub sommelier: SommelierClient,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        // One connection pool shared across all downstream services.
        let client = Client::new();
        let http = |base_url: &str| HttpClient::new(client.clone(), base_url);

        AppState {
            aggregator: Aggregator {
                catalog: CatalogClient::new(http(&config.catalog_service)),
                search: SearchClient::new(http(&config.search_service)),
                embeddings: EmbeddingsClient::new(http(&config.embeddings_service)),
                recs: RecsClient::new(http(&config.recs_service)),
                persist: PersistClient::new(http(&config.persist_service)),
            },
            sommelier: SommelierClient::new(http(&config.sommelier_service)),
        }
    }
}
