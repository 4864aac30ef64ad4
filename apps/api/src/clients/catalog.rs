use crate::clients::{HttpClient, QueryPairs};
use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::wine::{PaginatedList, Wine};

/// Catalog service: hydrates wine ids into full records and serves
/// unranked catalog pages.
#[derive(Clone)]
pub struct CatalogClient {
    http: HttpClient,
}

impl CatalogClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Fetch wines by id list. The catalog does not guarantee result order
    /// matches the input order, and ids missing from the catalog are
    /// silently absent from the result.
    pub async fn wines_by_ids(
        &self,
        ids: &[i64],
        ctx: &RequestContext,
    ) -> Result<Vec<Wine>, AppError> {
        let query: QueryPairs = ids.iter().map(|id| ("ids", id.to_string())).collect();
        self.http.get("/wines", &query, ctx).await
    }

    /// One page of the full catalog, in catalog order, with exact totals.
    pub async fn wines_page(
        &self,
        page: u32,
        page_size: u32,
        ctx: &RequestContext,
    ) -> Result<PaginatedList<Wine>, AppError> {
        let query: QueryPairs = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        self.http.get("/wines/batch", &query, ctx).await
    }
}
