use serde::Serialize;

use crate::clients::{HttpClient, QueryPairs};
use crate::context::RequestContext;
use crate::errors::AppError;

#[derive(Debug, Serialize)]
struct CellarMutation<'a> {
    user_id: &'a str,
    wine_id: i64,
}

/// Persistence service owns the cellar table. Exposed here as named,
/// server-validated operations only; this layer never sends query strings
/// for remote execution.
#[derive(Clone)]
pub struct PersistClient {
    http: HttpClient,
}

impl PersistClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The user's full cellar id set. Callers pass a resolved (non-empty)
    /// user id; anonymous requests never reach the persist service.
    pub async fn cellar_ids(
        &self,
        user_id: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<i64>, AppError> {
        let query: QueryPairs = vec![("user_id", user_id.to_string())];
        self.http.get("/cellar/ids", &query, ctx).await
    }

    /// Insert one cellar row. Duplicate inserts are a caller bug and get no
    /// special handling here.
    pub async fn add_cellar_wine(
        &self,
        user_id: &str,
        wine_id: i64,
        ctx: &RequestContext,
    ) -> Result<(), AppError> {
        let body = CellarMutation { user_id, wine_id };
        let _: serde_json::Value = self.http.post("/cellar/add", &body, ctx).await?;
        Ok(())
    }

    /// Delete one cellar row scoped to (wine id, user id); no effect if the
    /// row does not exist.
    pub async fn remove_cellar_wine(
        &self,
        user_id: &str,
        wine_id: i64,
        ctx: &RequestContext,
    ) -> Result<(), AppError> {
        let body = CellarMutation { user_id, wine_id };
        let _: serde_json::Value = self.http.post("/cellar/remove", &body, ctx).await?;
        Ok(())
    }
}
