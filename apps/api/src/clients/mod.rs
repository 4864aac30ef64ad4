//! Downstream service clients.
//!
//! ARCHITECTURAL RULE: no other module may call a backend service directly.
//! Every call goes through `HttpClient`, which attaches the request context
//! as the `baggage` header and surfaces non-success responses verbatim as
//! `AppError::Downstream`. No retries and no layer-local timeouts: a call
//! either completes or fails, and failures propagate to the caller.

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::context::RequestContext;
use crate::errors::AppError;

pub mod catalog;
pub mod embeddings;
pub mod persist;
pub mod recs;
pub mod search;
pub mod sommelier;

pub use catalog::CatalogClient;
pub use embeddings::EmbeddingsClient;
pub use persist::PersistClient;
pub use recs::RecsClient;
pub use search::SearchClient;
pub use sommelier::SommelierClient;

/// Query pairs; list-valued inputs serialize as repeated keys.
pub type QueryPairs<'a> = Vec<(&'a str, String)>;

/// Shared transport wrapper over `reqwest::Client`, one per backend service.
/// Constructed once at startup from a config base URL.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET with query-string input, decoded as JSON.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryPairs<'_>,
        ctx: &RequestContext,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .header("baggage", ctx.baggage())
            .send()
            .await?;
        Self::decode(path, response).await
    }

    /// POST with a JSON body, decoded as JSON.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        ctx: &RequestContext,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .header("baggage", ctx.baggage())
            .send()
            .await?;
        Self::decode(path, response).await
    }

    /// POST returning the raw response handle (status + headers + byte
    /// stream), undecoded. Used by the stream proxy and consumer; the body
    /// is never buffered here.
    pub async fn post_stream<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: &RequestContext,
    ) -> Result<reqwest::Response, AppError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .header("baggage", ctx.baggage())
            .send()
            .await?;
        Self::check_status(path, response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let response = Self::check_status(path, response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Downstream {
                status: status.as_u16(),
                body,
            });
        }
        debug!("{path} -> {status}");
        Ok(response)
    }
}
