//! Request context: one immutable context per inbound request, threaded
//! through every downstream call as the `baggage` header.
//!
//! Correlation id continuity: an inbound `x-request-id` is reused so a call
//! chain shares one id; otherwise a fresh UUID is generated. Identity comes
//! from the externally resolved `x-user-id`/`x-username` headers; empty
//! strings mean anonymous, which downstream services must accept.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
    pub user_id: String,
    pub username: String,
}

impl RequestContext {
    /// Pure construction from inbound headers; no side effects.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let correlation_id = header_str(headers, "x-request-id")
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        RequestContext {
            correlation_id,
            user_id: header_str(headers, "x-user-id").unwrap_or("").to_string(),
            username: header_str(headers, "x-username").unwrap_or("").to_string(),
        }
    }

    /// Anonymous context with a fresh correlation id.
    #[cfg(test)]
    pub fn anonymous() -> Self {
        RequestContext::from_headers(&HeaderMap::new())
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_empty()
    }

    /// The user id, or `Unauthenticated` for anonymous requests.
    /// Mutations call this before touching the persist service.
    pub fn require_user(&self) -> Result<&str, AppError> {
        if self.is_anonymous() {
            return Err(AppError::Unauthenticated);
        }
        Ok(&self.user_id)
    }

    /// Encodes the context as the outgoing `baggage` header value:
    /// comma-separated `key=value` pairs.
    pub fn baggage(&self) -> String {
        format!(
            "request-id={},user-id={},username={}",
            self.correlation_id, self.user_id, self.username
        )
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::from_headers(&parts.headers))
    }
}
