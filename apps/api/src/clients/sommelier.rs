use crate::clients::HttpClient;
use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::chat::{ChatRequest, ChatResponse};

/// Conversational sommelier agent.
#[derive(Clone)]
pub struct SommelierClient {
    http: HttpClient,
}

impl SommelierClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Single complete response.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        ctx: &RequestContext,
    ) -> Result<ChatResponse, AppError> {
        self.http.post("/chat", request, ctx).await
    }

    /// Streaming handle: status + headers + undecoded SSE byte stream.
    /// A failure here means the stream could never be opened.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        ctx: &RequestContext,
    ) -> Result<reqwest::Response, AppError> {
        self.http
            .post_stream("/chat/stream", request, ctx)
            .await
            .map_err(|e| AppError::StreamEstablishment(e.to_string()))
    }
}
