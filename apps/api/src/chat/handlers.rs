use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::chat::consumer::fold_stream;
use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::state::AppState;

/// POST /api/chat/stream
///
/// Relays the upstream SSE body verbatim and unbuffered; chunks are
/// forwarded as they arrive so the browser can render incrementally. If
/// the client disconnects, dropping the body stream drops the upstream
/// response and cancels that connection too. A failure to open the
/// upstream stream surfaces as a single non-streamed error payload.
pub async fn handle_chat_stream(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    validate(&request)?;
    let upstream = state.sommelier.chat_stream(&request, &ctx).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// POST /api/chat
///
/// Non-streamed variant: opens the upstream stream and folds it
/// server-side into one complete reply. When the stream cannot be opened
/// at all, falls back to the agent's complete-response endpoint. A turn
/// that fails mid-stream still answers 200 with the fixed apology content,
/// so the browser's conversation history stays intact.
pub async fn handle_chat(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    validate(&request)?;
    let upstream = match state.sommelier.chat_stream(&request, &ctx).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::warn!("Chat stream unavailable, using complete endpoint: {e}");
            return Ok(Json(state.sommelier.chat(&request, &ctx).await?));
        }
    };

    let message = fold_stream(upstream.bytes_stream()).await;
    Ok(Json(ChatResponse {
        response: message.content,
        recommended_wines: message.attached_wines,
    }))
}

fn validate(request: &ChatRequest) -> Result<(), AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    Ok(())
}
