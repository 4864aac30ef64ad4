//! SSE frame reassembly. The upstream stream is newline-delimited
//! `data: <json>` records, and records do not align with network chunk
//! boundaries. A record may arrive split across chunks, and one chunk may
//! carry several records. The decoder buffers raw bytes and only emits
//! events for complete lines.

use tracing::warn;

use crate::chat::frames::StreamEvent;

const DATA_PREFIX: &[u8] = b"data: ";

#[derive(Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk; returns every event completed by it.
    /// A malformed record is logged and skipped; it never aborts the
    /// stream, and records after it still decode.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = trim_line(&line);
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                // Blank separator lines and non-data fields are ignored.
                continue;
            };
            match serde_json::from_slice::<StreamEvent>(payload) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(
                        "Skipping malformed stream record: {e} ({})",
                        String::from_utf8_lossy(payload)
                    );
                }
            }
        }
        events
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
