use serde::Deserialize;

use crate::models::wine::Wine;

/// One decoded SSE record from the sommelier stream, discriminated by
/// the `type` field of the JSON payload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Transient "thinking" text; replaces the pending content.
    Status { message: String },
    /// Diagnostic detail, hidden behind a user toggle.
    Trace { message: String },
    /// Human-readable progress narration, always shown.
    User { message: String },
    /// Terminal success: final content plus attached recommendations.
    Complete {
        response: String,
        #[serde(default)]
        recommended_wines: Vec<Wine>,
    },
    /// Terminal failure.
    Error { message: String },
}
