use crate::clients::{HttpClient, QueryPairs};
use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::wine::PaginatedList;

/// Lexical search service: full-text ranking with server-side paging.
#[derive(Clone)]
pub struct SearchClient {
    http: HttpClient,
}

impl SearchClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// One ranked page of wine ids plus exact total/total_pages.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
        ctx: &RequestContext,
    ) -> Result<PaginatedList<i64>, AppError> {
        let query: QueryPairs = vec![
            ("query", query.to_string()),
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        self.http.get("/search", &query, ctx).await
    }
}
