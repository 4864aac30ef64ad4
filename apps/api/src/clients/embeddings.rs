use crate::clients::{HttpClient, QueryPairs};
use crate::context::RequestContext;
use crate::errors::AppError;

/// Semantic (embeddings) search service. Unlike lexical search it has no
/// server-side paging: one flat ranked id list, capped by `limit`. The
/// orchestrator over-fetches and pages the list itself.
#[derive(Clone)]
pub struct EmbeddingsClient {
    http: HttpClient,
}

impl EmbeddingsClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn search(
        &self,
        query: &str,
        limit: u32,
        ctx: &RequestContext,
    ) -> Result<Vec<i64>, AppError> {
        let query: QueryPairs = vec![("query", query.to_string()), ("limit", limit.to_string())];
        self.http.get("/semantic_search", &query, ctx).await
    }
}
