pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::state::AppState;
use crate::wines::handlers as wines;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/wines/search", get(wines::handle_search))
        .route(
            "/api/wines/semantic_search",
            get(wines::handle_semantic_search),
        )
        .route(
            "/api/wines/recommendations",
            get(wines::handle_recommendations),
        )
        .route("/api/cellar", get(wines::handle_cellar))
        .route("/api/cellar/ids", get(wines::handle_cellar_ids))
        .route("/api/cellar/add", post(wines::handle_cellar_add))
        .route("/api/cellar/remove", post(wines::handle_cellar_remove))
        .route("/api/chat", post(chat::handle_chat))
        .route("/api/chat/stream", post(chat::handle_chat_stream))
        .with_state(state)
}
