//! Incremental state reducer for one conversational turn.
//!
//! A turn starts as a pending placeholder message and is mutated in place
//! as stream events arrive: `status` replaces the content, `trace`/`user`
//! append to their lines, and `complete`/`error` are terminal. Exactly one
//! terminal transition happens per turn; events after it are ignored.
//! Trace lines accumulated before the terminal frame are preserved on the
//! final message. A transport failure mid-stream is folded into the same
//! terminal error state as an `error` frame.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::{pin_mut, Stream, StreamExt};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::chat::decoder::FrameDecoder;
use crate::chat::frames::StreamEvent;
use crate::models::chat::Role;
use crate::models::wine::Wine;

/// Fixed content shown when a turn fails, whether via an `error` frame or
/// a transport failure.
pub const ERROR_CONTENT: &str =
    "I apologize, but I encountered an error while processing your request. Please try again.";

const PENDING_CONTENT: &str = "Thinking...";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub is_terminal: bool,
    pub failed: bool,
    pub trace_lines: Vec<String>,
    pub user_notes: Vec<String>,
    pub attached_wines: Vec<Wine>,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    /// The placeholder shown while the turn is in flight.
    pub fn pending() -> Self {
        ConversationMessage {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: PENDING_CONTENT.to_string(),
            is_terminal: false,
            failed: false,
            trace_lines: Vec::new(),
            user_notes: Vec::new(),
            attached_wines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The reducer: folds one event into the message. A no-op once the
    /// message is terminal.
    pub fn apply(&mut self, event: StreamEvent) {
        if self.is_terminal {
            return;
        }
        match event {
            StreamEvent::Status { message } => self.content = message,
            StreamEvent::Trace { message } => self.trace_lines.push(message),
            StreamEvent::User { message } => self.user_notes.push(message),
            StreamEvent::Complete {
                response,
                recommended_wines,
            } => {
                self.content = response;
                self.attached_wines = recommended_wines;
                self.is_terminal = true;
            }
            StreamEvent::Error { message } => {
                warn!("Sommelier stream reported an error: {message}");
                self.fail();
            }
        }
    }

    /// Terminal failure: fixed content, no attached wines. Trace lines are
    /// kept for debugging. A no-op once terminal.
    pub fn fail(&mut self) {
        if self.is_terminal {
            return;
        }
        self.content = ERROR_CONTENT.to_string();
        self.attached_wines = Vec::new();
        self.is_terminal = true;
        self.failed = true;
    }
}

/// Drives the decoder and reducer over an SSE byte stream until the turn
/// reaches a terminal state. Stream exhaustion without a terminal frame and
/// transport errors mid-read both end the turn in the failed state.
pub async fn fold_stream<S, E>(stream: S) -> ConversationMessage
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut message = ConversationMessage::pending();
    let mut decoder = FrameDecoder::new();

    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                for event in decoder.push(&bytes) {
                    message.apply(event);
                }
            }
            Err(e) => {
                warn!("Transport failure mid-stream: {e}");
                message.fail();
                return message;
            }
        }
        if message.is_terminal {
            // Stop reading: nothing after the terminal frame applies, and
            // dropping the stream releases the upstream connection.
            return message;
        }
    }

    if !message.is_terminal {
        warn!("Stream ended without a terminal frame");
        message.fail();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn record(json: &str) -> Bytes {
        Bytes::from(format!("data: {json}\n\n"))
    }

    fn ok_chunks(chunks: Vec<Bytes>) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(chunks.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_success_scenario_folds_all_frame_kinds() {
        let wine = serde_json::to_string(&Wine::fixture(42)).unwrap();
        let chunks = vec![
            record(r#"{"type": "status", "message": "Thinking"}"#),
            record(r#"{"type": "trace", "message": "calling search"}"#),
            record(r#"{"type": "user", "message": "Looking through catalog"}"#),
            record(&format!(
                r#"{{"type": "complete", "response": "Try this Pinot", "recommended_wines": [{wine}]}}"#
            )),
        ];

        let message = fold_stream(ok_chunks(chunks)).await;

        assert!(message.is_terminal);
        assert!(!message.failed);
        assert_eq!(message.content, "Try this Pinot");
        assert_eq!(message.trace_lines, vec!["calling search"]);
        assert_eq!(message.user_notes, vec!["Looking through catalog"]);
        assert_eq!(message.attached_wines, vec![Wine::fixture(42)]);
    }

    #[tokio::test]
    async fn test_error_frame_preserves_traces_and_marks_failed() {
        let chunks = vec![
            record(r#"{"type": "trace", "message": "t1"}"#),
            record(r#"{"type": "trace", "message": "t2"}"#),
            record(r#"{"type": "error", "message": "rate limited"}"#),
        ];

        let message = fold_stream(ok_chunks(chunks)).await;

        assert!(message.is_terminal);
        assert!(message.failed);
        assert_eq!(message.content, ERROR_CONTENT);
        assert_eq!(message.trace_lines.len(), 2);
        assert!(message.attached_wines.is_empty());
    }

    #[tokio::test]
    async fn test_frames_after_complete_are_ignored() {
        let mut message = ConversationMessage::pending();
        message.apply(StreamEvent::Complete {
            response: "done".to_string(),
            recommended_wines: Vec::new(),
        });
        message.apply(StreamEvent::Status {
            message: "late".to_string(),
        });
        message.apply(StreamEvent::Error {
            message: "late".to_string(),
        });

        assert_eq!(message.content, "done");
        assert!(!message.failed);
    }

    #[tokio::test]
    async fn test_exactly_one_terminal_transition() {
        let mut message = ConversationMessage::pending();
        message.fail();
        let failed_content = message.content.clone();
        message.apply(StreamEvent::Complete {
            response: "too late".to_string(),
            recommended_wines: Vec::new(),
        });
        assert_eq!(message.content, failed_content);
        assert!(message.failed);
    }

    #[tokio::test]
    async fn test_transport_failure_ends_in_error_state() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(record(r#"{"type": "trace", "message": "t1"}"#)),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )),
        ];

        let message = fold_stream(stream::iter(chunks)).await;

        assert!(message.failed);
        assert_eq!(message.content, ERROR_CONTENT);
        assert_eq!(message.trace_lines, vec!["t1"]);
    }

    #[tokio::test]
    async fn test_stream_end_without_terminal_frame_fails_the_turn() {
        let chunks = vec![record(r#"{"type": "status", "message": "Thinking"}"#)];
        let message = fold_stream(ok_chunks(chunks)).await;
        assert!(message.failed);
        assert_eq!(message.content, ERROR_CONTENT);
    }

    #[tokio::test]
    async fn test_record_split_across_chunks_still_applies() {
        let full = r#"data: {"type": "complete", "response": "Split ok"}"#;
        let (a, b) = full.split_at(25);
        let chunks = vec![
            Bytes::from(a.to_string()),
            Bytes::from(format!("{b}\n\n")),
        ];

        let message = fold_stream(ok_chunks(chunks)).await;
        assert!(!message.failed);
        assert_eq!(message.content, "Split ok");
    }

    #[tokio::test]
    async fn test_malformed_record_amid_valid_ones() {
        let chunks = vec![
            record(r#"{"type": "user", "message": "before"}"#),
            Bytes::from("data: {broken\n\n"),
            record(r#"{"type": "user", "message": "after"}"#),
            record(r#"{"type": "complete", "response": "ok"}"#),
        ];

        let message = fold_stream(ok_chunks(chunks)).await;
        assert!(!message.failed);
        assert_eq!(message.user_notes, vec!["before", "after"]);
    }
}
