use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    /// A backend service answered with a non-success status. The upstream
    /// status and body are carried verbatim, never swallowed or retried here.
    #[error("Downstream error (status {status}): {body}")]
    Downstream { status: u16, body: String },

    /// The downstream request never produced a response (DNS, connect,
    /// mid-body transport failure).
    #[error("Upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream chat stream could not be opened. Fatal for the request;
    /// surfaced as a single non-streamed error payload.
    #[error("Failed to establish upstream stream: {0}")]
    StreamEstablishment(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Authentication required".to_string(),
            ),
            AppError::Downstream { status, body } => {
                tracing::error!("Downstream error {status}: {body}");
                // Preserve the upstream status where it is a valid HTTP status,
                // otherwise fall back to a generic bad-gateway.
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, "DOWNSTREAM_ERROR", body.clone())
            }
            AppError::Transport(e) => {
                tracing::error!("Upstream transport error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNREACHABLE",
                    "A backend service could not be reached".to_string(),
                )
            }
            AppError::StreamEstablishment(msg) => {
                tracing::error!("Stream establishment failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "STREAM_ERROR",
                    "Could not open the chat stream".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
