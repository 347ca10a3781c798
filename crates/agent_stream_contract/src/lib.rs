//! Wire contracts shared by the agent proxy endpoints and the desktop chat applications.
//!
//! This crate is intentionally runtime-agnostic. It defines the JSON request and error bodies,
//! the streamed event payloads, and the `data: ...` server-sent-event framing without depending
//! on an HTTP server, Leptos, or browser APIs.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};

/// Payload of the frame that terminates every successful stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Content type of streamed agent responses.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Speaker of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Turn authored by the person using the desktop.
    User,
    /// Turn produced by the agent.
    Assistant,
}

impl ChatRole {
    /// Parses the wire role name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Returns the wire role name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker.
    pub role: ChatRole,
    /// Plain-text content.
    pub content: String,
}

impl ChatMessage {
    /// Builds a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Builds an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request body accepted by the streaming agent endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
}

/// JSON body of every non-streamed error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// Event payload carried by one `data:` frame of a streamed agent response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Fragment of assistant text.
    TextDelta {
        /// Text to append.
        text: String,
    },
    /// The agent started invoking a tool.
    ToolStart {
        /// Tool name as reported by the agent runtime.
        tool: String,
    },
    /// A running tool is still working.
    ToolProgress {
        /// Tool name as reported by the agent runtime.
        tool: String,
        /// Seconds elapsed since the tool started.
        elapsed: f64,
    },
    /// The agent finished successfully.
    Done,
    /// The agent run failed; the stream still terminates normally.
    Error {
        /// Caller-safe failure description.
        message: String,
    },
}

impl StreamEvent {
    /// Returns `true` for events after which the agent produces nothing further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// Encodes a raw payload as one `data: ...` frame.
pub fn encode_data_frame(payload: &str) -> String {
    format!("data: {payload}\n\n")
}

/// Encodes a [`StreamEvent`] as one `data: <json>` frame.
pub fn encode_event_frame(event: &StreamEvent) -> String {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| {
        r#"{"type":"error","message":"Failed to encode stream event"}"#.to_string()
    });
    encode_data_frame(&payload)
}

/// Returns the frame that terminates a stream.
pub fn encode_done_frame() -> String {
    encode_data_frame(DONE_SENTINEL)
}

/// One decoded server-sent-event frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// `data:` payload (multi-line payloads joined with `\n`).
    Data(String),
    /// The `[DONE]` terminator.
    Done,
}

impl SseFrame {
    /// Parses a data frame as a [`StreamEvent`].
    pub fn to_stream_event(&self) -> Option<Result<StreamEvent, serde_json::Error>> {
        match self {
            Self::Data(payload) => Some(serde_json::from_str(payload)),
            Self::Done => None,
        }
    }
}

/// Incremental decoder for `data:`-framed server-sent events.
///
/// Chunks may split frames, lines, and UTF-8 sequences at arbitrary byte offsets. Comment lines
/// and fields other than `data` are ignored, and frames without data are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    pending_bytes: Vec<u8>,
}

impl SseDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns every frame completed by them.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending_bytes.extend_from_slice(chunk);
        let valid_len = match std::str::from_utf8(&self.pending_bytes) {
            Ok(text) => text.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => {
                let lossy = String::from_utf8_lossy(&self.pending_bytes).into_owned();
                self.pending_bytes.clear();
                return self.push_str(&lossy);
            }
        };
        let rest = self.pending_bytes.split_off(valid_len);
        let complete = std::mem::replace(&mut self.pending_bytes, rest);
        match String::from_utf8(complete) {
            Ok(text) => self.push_str(&text),
            Err(_) => Vec::new(),
        }
    }

    /// Feeds text and returns every frame completed by it.
    pub fn push_str(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buffer.push_str(chunk);
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_block(&block) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a trailing frame that was not followed by a blank line.
    pub fn finish(mut self) -> Option<SseFrame> {
        if !self.pending_bytes.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
            self.buffer.push_str(&tail);
        }
        parse_block(&self.buffer)
    }
}

fn parse_block(block: &str) -> Option<SseFrame> {
    let mut data_lines = Vec::new();
    for line in block.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data_lines.is_empty() {
        return None;
    }

    let payload = data_lines.join("\n");
    if payload.trim() == DONE_SENTINEL {
        Some(SseFrame::Done)
    } else if payload.trim().is_empty() {
        None
    } else {
        Some(SseFrame::Data(payload))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stream_events_use_snake_case_type_tags() {
        let frame = encode_event_frame(&StreamEvent::ToolProgress {
            tool: "browser_snapshot".to_string(),
            elapsed: 2.5,
        });
        assert_eq!(
            frame,
            "data: {\"type\":\"tool_progress\",\"tool\":\"browser_snapshot\",\"elapsed\":2.5}\n\n"
        );
        assert_eq!(encode_event_frame(&StreamEvent::Done), "data: {\"type\":\"done\"}\n\n");
        assert_eq!(encode_done_frame(), "data: [DONE]\n\n");
    }

    #[test]
    fn decoder_reassembles_frames_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push_str("data: {\"type\":\"text_").is_empty());
        let frames = decoder.push_str("delta\",\"text\":\"hi\"}\n\ndata: [DO");
        assert_eq!(
            frames,
            vec![SseFrame::Data(
                "{\"type\":\"text_delta\",\"text\":\"hi\"}".to_string()
            )]
        );
        assert_eq!(decoder.push_str("NE]\n\n"), vec![SseFrame::Done]);
    }

    #[test]
    fn decoder_ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push_str(": keep-alive\n\nevent: message\nid: 7\ndata: a\ndata: b\n\n");
        assert_eq!(frames, vec![SseFrame::Data("a\nb".to_string())]);
    }

    #[test]
    fn decoder_handles_crlf_and_utf8_split_inside_a_character() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: caf\u{e9}\r\n\r\n".as_bytes();
        let split = bytes.len() - 5;
        assert!(decoder.push_bytes(&bytes[..split]).is_empty());
        assert_eq!(
            decoder.push_bytes(&bytes[split..]),
            vec![SseFrame::Data("caf\u{e9}".to_string())]
        );
    }

    #[test]
    fn decoder_finish_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push_str("data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), Some(SseFrame::Done));
    }

    #[test]
    fn decoded_frames_parse_back_into_stream_events() {
        let mut decoder = SseDecoder::new();
        let wire = format!(
            "{}{}",
            encode_event_frame(&StreamEvent::Error {
                message: "Agent run failed".to_string()
            }),
            encode_done_frame()
        );
        let frames = decoder.push_str(&wire);
        assert_eq!(frames.len(), 2);
        let event = frames[0]
            .to_stream_event()
            .expect("data frame")
            .expect("valid event");
        assert!(event.is_terminal());
        assert!(frames[1].to_stream_event().is_none());
    }

    #[test]
    fn chat_roles_round_trip_their_wire_names() {
        assert_eq!(ChatRole::parse("user"), Some(ChatRole::User));
        assert_eq!(ChatRole::parse("assistant"), Some(ChatRole::Assistant));
        assert_eq!(ChatRole::parse("system"), None);
        assert_eq!(ChatRole::Assistant.as_str(), "assistant");
    }
}
