//! Aggregation orchestrator: turns one logical search/recommend request
//! into coordinated calls against a ranking service and the catalog, merges
//! in the user's cellar membership, and reconciles the three different
//! pagination shapes (catalog paging, search paging, bare ranked lists)
//! into one result type.
//!
//! The ranking call and the membership fetch are independent and run
//! concurrently; hydration has a data dependency on ranking and waits for
//! its id list. Any downstream failure aborts the whole operation, no
//! partial results.

use std::collections::{HashMap, HashSet};

use crate::clients::{
    CatalogClient, EmbeddingsClient, PersistClient, RecsClient, SearchClient,
};
use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::wine::{CellarWine, Wine, WineResults};

/// Semantic search over-fetches this many pages worth of ids so that the
/// locally computed `total` covers a few pages of browsing. The reported
/// total is therefore approximate, bounded by the over-fetch limit.
const OVERFETCH_FACTOR: u32 = 5;

/// Fixed result size for the unpaged recommendation path.
const RECS_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct Aggregator {
    pub catalog: CatalogClient,
    pub search: SearchClient,
    pub embeddings: EmbeddingsClient,
    pub recs: RecsClient,
    pub persist: PersistClient,
}

impl Aggregator {
    /// Lexical search. Blank queries bypass ranking and page the raw
    /// catalog instead. Totals always come from the ranking (or catalog)
    /// service verbatim, never recomputed from the hydrated item count,
    /// which may legitimately fall short when a ranked id is missing from
    /// the catalog.
    pub async fn search_wines(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
        ctx: &RequestContext,
    ) -> Result<WineResults, AppError> {
        validate_paging(page, page_size)?;

        if query.trim().is_empty() {
            let (page_result, cellar) = tokio::join!(
                self.catalog.wines_page(page, page_size, ctx),
                self.cellar_id_set(ctx),
            );
            let page_result = page_result?;
            let cellar = cellar?;
            return Ok(WineResults {
                items: decorate(page_result.items, &cellar),
                total: page_result.total,
                page: page_result.page,
                page_size: page_result.page_size,
                total_pages: page_result.total_pages,
                total_is_approximate: false,
            });
        }

        let (ranked, cellar) = tokio::join!(
            self.search.search(query, page, page_size, ctx),
            self.cellar_id_set(ctx),
        );
        let ranked = ranked?;
        let cellar = cellar?;

        let wines = self.hydrate_ordered(&ranked.items, ctx).await?;
        Ok(WineResults {
            items: decorate(wines, &cellar),
            total: ranked.total,
            page: ranked.page,
            page_size: ranked.page_size,
            total_pages: ranked.total_pages,
            total_is_approximate: false,
        })
    }

    /// Semantic search. The embeddings service has no server-side paging,
    /// so we over-fetch a flat ranked list, slice the requested page out of
    /// it locally, and hydrate only the slice. `total` is the ranked-list
    /// length bounded by the over-fetch limit, flagged as approximate.
    pub async fn semantic_search_wines(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
        ctx: &RequestContext,
    ) -> Result<WineResults, AppError> {
        validate_paging(page, page_size)?;

        // Paging values come straight off the query string; widen to u64 so
        // hostile page numbers cannot overflow the over-fetch arithmetic.
        let upper_bound = page as u64 * page_size as u64;
        let limit = upper_bound.max(page_size as u64 * OVERFETCH_FACTOR as u64);
        let limit = u32::try_from(limit)
            .map_err(|_| AppError::Validation("page * page_size is too large".to_string()))?;

        let (ranked, cellar) = tokio::join!(
            self.embeddings.search(query, limit, ctx),
            self.cellar_id_set(ctx),
        );
        let ranked = ranked?;
        let cellar = cellar?;

        let start = (page as u64 - 1) * page_size as u64;
        let slice: &[i64] = if start < ranked.len() as u64 {
            let start = start as usize;
            let end = (start + page_size as usize).min(ranked.len());
            &ranked[start..end]
        } else {
            &[]
        };

        let wines = self.hydrate_ordered(slice, ctx).await?;
        let total = ranked.len() as u64;
        Ok(WineResults {
            items: decorate(wines, &cellar),
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size as u64) as u32,
            total_is_approximate: true,
        })
    }

    /// Recommendations are unpaged: one fixed-limit ranked list, hydrated in
    /// full and reported as a single page.
    pub async fn recommend_wines(
        &self,
        query: &str,
        ctx: &RequestContext,
    ) -> Result<WineResults, AppError> {
        let (ranked, cellar) = tokio::join!(
            self.recs.recommendations(query, RECS_LIMIT, ctx),
            self.cellar_id_set(ctx),
        );
        let ranked = ranked?;
        let cellar = cellar?;

        let wines = self.hydrate_ordered(&ranked, ctx).await?;
        let total = wines.len() as u64;
        Ok(WineResults {
            items: decorate(wines, &cellar),
            total,
            page: 1,
            page_size: RECS_LIMIT,
            total_pages: 1,
            total_is_approximate: false,
        })
    }

    /// The user's cellar, hydrated. Requires identity.
    pub async fn cellar_wines(&self, ctx: &RequestContext) -> Result<Vec<CellarWine>, AppError> {
        let user_id = ctx.require_user()?;
        let ids = self.persist.cellar_ids(user_id, ctx).await?;
        let wines = self.hydrate_ordered(&ids, ctx).await?;
        Ok(wines
            .into_iter()
            .map(|wine| CellarWine {
                wine,
                in_cellar: true,
            })
            .collect())
    }

    /// Raw cellar id list, for client-side membership bootstrap.
    /// Anonymous callers get an empty list without a persist call.
    pub async fn cellar_ids(&self, ctx: &RequestContext) -> Result<Vec<i64>, AppError> {
        if ctx.is_anonymous() {
            return Ok(Vec::new());
        }
        self.persist.cellar_ids(&ctx.user_id, ctx).await
    }

    pub async fn add_to_cellar(&self, wine_id: i64, ctx: &RequestContext) -> Result<(), AppError> {
        let user_id = ctx.require_user()?;
        self.persist.add_cellar_wine(user_id, wine_id, ctx).await
    }

    pub async fn remove_from_cellar(
        &self,
        wine_id: i64,
        ctx: &RequestContext,
    ) -> Result<(), AppError> {
        let user_id = ctx.require_user()?;
        self.persist.remove_cellar_wine(user_id, wine_id, ctx).await
    }

    /// Hydrates an id list, re-imposing the ranked order (the catalog does
    /// not guarantee result order). Ids missing from the catalog are
    /// dropped. Empty input short-circuits without a catalog call.
    async fn hydrate_ordered(
        &self,
        ids: &[i64],
        ctx: &RequestContext,
    ) -> Result<Vec<Wine>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wines = self.catalog.wines_by_ids(ids, ctx).await?;
        let mut by_id: HashMap<i64, Wine> =
            wines.into_iter().map(|wine| (wine.id, wine)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Membership set for the current user; empty for anonymous requests,
    /// with no persist call made.
    async fn cellar_id_set(&self, ctx: &RequestContext) -> Result<HashSet<i64>, AppError> {
        if ctx.is_anonymous() {
            return Ok(HashSet::new());
        }
        let ids = self.persist.cellar_ids(&ctx.user_id, ctx).await?;
        Ok(ids.into_iter().collect())
    }
}

fn validate_paging(page: u32, page_size: u32) -> Result<(), AppError> {
    if page == 0 || page_size == 0 {
        return Err(AppError::Validation(
            "page and page_size must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn decorate(wines: Vec<Wine>, cellar: &HashSet<i64>) -> Vec<CellarWine> {
    wines
        .into_iter()
        .map(|wine| {
            let in_cellar = cellar.contains(&wine.id);
            CellarWine { wine, in_cellar }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpClient;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// All five clients pointed at one mock server; the route paths keep
    /// the services apart.
    fn aggregator(server: &MockServer) -> Aggregator {
        let http = || HttpClient::new(reqwest::Client::new(), &server.uri());
        Aggregator {
            catalog: CatalogClient::new(http()),
            search: SearchClient::new(http()),
            embeddings: EmbeddingsClient::new(http()),
            recs: RecsClient::new(http()),
            persist: PersistClient::new(http()),
        }
    }

    fn anon() -> RequestContext {
        RequestContext {
            correlation_id: "rid-test".to_string(),
            user_id: String::new(),
            username: String::new(),
        }
    }

    fn user(id: &str) -> RequestContext {
        RequestContext {
            correlation_id: "rid-test".to_string(),
            user_id: id.to_string(),
            username: "alice".to_string(),
        }
    }

    fn wine_json(id: i64) -> serde_json::Value {
        serde_json::to_value(Wine::fixture(id)).unwrap()
    }

    async fn mount_wines(server: &MockServer, ids: &[i64]) {
        let body: Vec<_> = ids.iter().map(|id| wine_json(*id)).collect();
        Mock::given(method("GET"))
            .and(path("/wines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_lexical_totals_come_from_search_not_hydration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "pinot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [5, 7, 9],
                "total": 37,
                "page": 1,
                "page_size": 3,
                "total_pages": 13
            })))
            .mount(&server)
            .await;
        // Catalog is missing id 7, so hydration returns fewer items than ids.
        mount_wines(&server, &[5, 9]).await;

        let results = aggregator(&server)
            .search_wines("pinot", 1, 3, &anon())
            .await
            .unwrap();

        assert_eq!(results.items.len(), 2);
        assert_eq!(results.total, 37);
        assert_eq!(results.total_pages, 13);
        assert!(!results.total_is_approximate);
    }

    #[tokio::test]
    async fn test_blank_query_pages_raw_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wines/batch"))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [wine_json(3), wine_json(4)],
                "total": 10,
                "page": 2,
                "page_size": 2,
                "total_pages": 5
            })))
            .mount(&server)
            .await;
        // No /search mock: a ranking call would 404 and fail the test.

        let results = aggregator(&server)
            .search_wines("   ", 2, 2, &anon())
            .await
            .unwrap();
        assert_eq!(results.total, 10);
        assert_eq!(results.page, 2);
        assert_eq!(results.items[0].wine.id, 3);
    }

    #[tokio::test]
    async fn test_empty_ranked_ids_skip_hydration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [],
                "total": 0,
                "page": 1,
                "page_size": 10,
                "total_pages": 0
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wines"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let results = aggregator(&server)
            .search_wines("nothing", 1, 10, &anon())
            .await
            .unwrap();
        assert!(results.items.is_empty());
        assert_eq!(results.total, 0);
    }

    #[tokio::test]
    async fn test_semantic_slice_and_approximate_total() {
        let server = MockServer::start().await;
        // Ranked list of 7 ids; page 2 of size 3 is ranked[3..6] = [14, 15, 16].
        Mock::given(method("GET"))
            .and(path("/semantic_search"))
            .and(query_param("limit", "15"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([11, 12, 13, 14, 15, 16, 17])),
            )
            .mount(&server)
            .await;
        // Catalog answers out of ranked order; the slice must come back
        // re-ordered to [14, 15, 16].
        mount_wines(&server, &[16, 14, 15]).await;

        let results = aggregator(&server)
            .semantic_search_wines("earthy", 2, 3, &anon())
            .await
            .unwrap();

        let ids: Vec<i64> = results.items.iter().map(|w| w.wine.id).collect();
        assert_eq!(ids, vec![14, 15, 16]);
        assert_eq!(results.total, 7);
        assert_eq!(results.total_pages, 3);
        assert!(results.total_is_approximate);
    }

    #[tokio::test]
    async fn test_semantic_page_past_end_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/semantic_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
            .mount(&server)
            .await;

        let results = aggregator(&server)
            .semantic_search_wines("rare", 5, 10, &anon())
            .await
            .unwrap();
        assert!(results.items.is_empty());
        assert_eq!(results.total, 2);
    }

    #[tokio::test]
    async fn test_recommend_is_single_page_with_exact_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recommendations"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([21, 22, 23])))
            .mount(&server)
            .await;
        mount_wines(&server, &[21, 22, 23]).await;

        let results = aggregator(&server)
            .recommend_wines("bold reds", &anon())
            .await
            .unwrap();

        assert_eq!(results.page, 1);
        assert_eq!(results.total_pages, 1);
        assert_eq!(results.total, results.items.len() as u64);
    }

    #[tokio::test]
    async fn test_membership_marks_exact_id_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [5, 7, 9],
                "total": 3,
                "page": 1,
                "page_size": 10,
                "total_pages": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cellar/ids"))
            .and(query_param("user_id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([5, 9])))
            .mount(&server)
            .await;
        mount_wines(&server, &[5, 7, 9]).await;

        let results = aggregator(&server)
            .search_wines("pinot", 1, 10, &user("42"))
            .await
            .unwrap();

        let flags: Vec<(i64, bool)> = results
            .items
            .iter()
            .map(|w| (w.wine.id, w.in_cellar))
            .collect();
        assert_eq!(flags, vec![(5, true), (7, false), (9, true)]);
    }

    #[tokio::test]
    async fn test_anonymous_search_skips_persist_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [5],
                "total": 1,
                "page": 1,
                "page_size": 10,
                "total_pages": 1
            })))
            .mount(&server)
            .await;
        mount_wines(&server, &[5]).await;
        Mock::given(method("GET"))
            .and(path("/cellar/ids"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let results = aggregator(&server)
            .search_wines("pinot", 1, 10, &anon())
            .await
            .unwrap();
        assert!(!results.items[0].in_cellar);
    }

    #[tokio::test]
    async fn test_anonymous_mutations_fail_without_downstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cellar/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cellar/remove"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .expect(0)
            .mount(&server)
            .await;

        let agg = aggregator(&server);
        assert!(matches!(
            agg.add_to_cellar(5, &anon()).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            agg.remove_from_cellar(5, &anon()).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_authenticated_add_posts_named_mutation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cellar/add"))
            .and(body_json(json!({ "user_id": "42", "wine_id": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .expect(1)
            .mount(&server)
            .await;

        aggregator(&server)
            .add_to_cellar(5, &user("42"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_downstream_failure_aborts_aggregation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("index down"))
            .mount(&server)
            .await;

        let err = aggregator(&server)
            .search_wines("pinot", 1, 10, &anon())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Downstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_semantic_overflowing_page_rejected_before_any_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/semantic_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        // page * page_size exceeds u32; must reject instead of wrapping.
        let err = aggregator(&server)
            .semantic_search_wines("q", u32::MAX, 2, &anon())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_zero_page_rejected() {
        let server = MockServer::start().await;
        let err = aggregator(&server)
            .search_wines("pinot", 0, 10, &anon())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
