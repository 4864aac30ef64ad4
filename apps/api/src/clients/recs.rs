use crate::clients::{HttpClient, QueryPairs};
use crate::context::RequestContext;
use crate::errors::AppError;

/// Recommendation service: one flat ranked id list, no paging metadata.
#[derive(Clone)]
pub struct RecsClient {
    http: HttpClient,
}

impl RecsClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn recommendations(
        &self,
        query: &str,
        limit: u32,
        ctx: &RequestContext,
    ) -> Result<Vec<i64>, AppError> {
        let query: QueryPairs = vec![("query", query.to_string()), ("limit", limit.to_string())];
        self.http.get("/recommendations", &query, ctx).await
    }
}
