use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::wine::{CellarWine, WineResults};
use crate::state::AppState;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Deserialize)]
pub struct RecommendQuery {
    pub query: String,
}

#[derive(Deserialize)]
pub struct CellarMutationQuery {
    pub wine_id: i64,
}

/// GET /api/wines/search
pub async fn handle_search(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<SearchQuery>,
) -> Result<Json<WineResults>, AppError> {
    let results = state
        .aggregator
        .search_wines(&params.query, params.page, params.page_size, &ctx)
        .await?;
    Ok(Json(results))
}

/// GET /api/wines/semantic_search
pub async fn handle_semantic_search(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<SearchQuery>,
) -> Result<Json<WineResults>, AppError> {
    let results = state
        .aggregator
        .semantic_search_wines(&params.query, params.page, params.page_size, &ctx)
        .await?;
    Ok(Json(results))
}

/// GET /api/wines/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<RecommendQuery>,
) -> Result<Json<WineResults>, AppError> {
    let results = state.aggregator.recommend_wines(&params.query, &ctx).await?;
    Ok(Json(results))
}

/// GET /api/cellar
pub async fn handle_cellar(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<CellarWine>>, AppError> {
    Ok(Json(state.aggregator.cellar_wines(&ctx).await?))
}

/// GET /api/cellar/ids
pub async fn handle_cellar_ids(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<i64>>, AppError> {
    Ok(Json(state.aggregator.cellar_ids(&ctx).await?))
}

/// POST /api/cellar/add
pub async fn handle_cellar_add(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<CellarMutationQuery>,
) -> Result<Json<()>, AppError> {
    state.aggregator.add_to_cellar(params.wine_id, &ctx).await?;
    Ok(Json(()))
}

/// POST /api/cellar/remove
pub async fn handle_cellar_remove(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<CellarMutationQuery>,
) -> Result<Json<()>, AppError> {
    state
        .aggregator
        .remove_from_cellar(params.wine_id, &ctx)
        .await?;
    Ok(Json(()))
}
