//! [`AgentRuntime`] backed by the agent SDK sidecar over HTTP.
//!
//! The sidecar accepts an [`AgentRunRequest`] at `POST /v1/query` and answers with an SSE
//! stream carrying one SDK message per `data:` frame.

use std::collections::VecDeque;
use std::fmt::Display;
use std::mem;

use agent_stream_contract::{SseDecoder, SseFrame, EVENT_STREAM_CONTENT_TYPE};
use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::runtime::{
    AgentEvent, AgentEventStream, AgentOutcome, AgentRunRequest, AgentRuntime, AgentRuntimeError,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SdkMessage {
    StreamEvent {
        event: SdkStreamEvent,
    },
    ToolProgress {
        tool_name: String,
        elapsed_time_seconds: f64,
    },
    Result(SdkResult),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SdkStreamEvent {
    ContentBlockDelta { delta: SdkDelta },
    ContentBlockStart { content_block: SdkContentBlock },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SdkDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SdkContentBlock {
    ToolUse { name: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct SdkResult {
    subtype: String,
    #[serde(default)]
    is_error: bool,
    num_turns: Option<u32>,
    total_cost_usd: Option<f64>,
    duration_ms: Option<f64>,
    #[serde(default)]
    errors: Vec<String>,
    result: Option<String>,
}

impl SdkResult {
    fn into_outcome(self) -> AgentOutcome {
        let mut outcome = if self.subtype == "success" && !self.is_error {
            AgentOutcome::success()
        } else {
            let detail = if self.errors.is_empty() {
                self.result
            } else {
                Some(self.errors.join("; "))
            };
            AgentOutcome::failed(self.subtype, detail)
        };
        outcome.num_turns = self.num_turns;
        outcome.cost_usd = self.total_cost_usd;
        outcome.duration_ms = self.duration_ms;
        outcome
    }
}

fn translate(message: SdkMessage) -> Option<AgentEvent> {
    match message {
        SdkMessage::StreamEvent { event } => match event {
            SdkStreamEvent::ContentBlockDelta {
                delta: SdkDelta::TextDelta { text },
            } if !text.is_empty() => Some(AgentEvent::TextDelta(text)),
            SdkStreamEvent::ContentBlockStart {
                content_block: SdkContentBlock::ToolUse { name },
            } => Some(AgentEvent::ToolStarted { tool: name }),
            _ => None,
        },
        SdkMessage::ToolProgress {
            tool_name,
            elapsed_time_seconds,
        } => Some(AgentEvent::ToolProgress {
            tool: tool_name,
            elapsed_seconds: elapsed_time_seconds,
        }),
        SdkMessage::Result(result) => Some(AgentEvent::Finished(result.into_outcome())),
        SdkMessage::Other => None,
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<AgentEvent, AgentRuntimeError>>,
    ended: bool,
}

impl<S> DecodeState<S> {
    fn queue_frame(&mut self, frame: SseFrame) {
        match frame {
            SseFrame::Done => self.ended = true,
            SseFrame::Data(payload) => match serde_json::from_str::<SdkMessage>(&payload) {
                Ok(message) => {
                    if let Some(event) = translate(message) {
                        self.pending.push_back(Ok(event));
                    }
                }
                Err(err) => {
                    self.pending
                        .push_back(Err(AgentRuntimeError::Decode(err.to_string())));
                    self.ended = true;
                }
            },
        }
    }
}

/// Turns a raw sidecar response body into agent events.
///
/// The stream ends at the `[DONE]` frame, at end of body, or after the first error.
pub(crate) fn decode_events<S, B, E>(body: S) -> AgentEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        ended: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.ended {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for frame in state.decoder.push_bytes(chunk.as_ref()) {
                        if state.ended {
                            break;
                        }
                        state.queue_frame(frame);
                    }
                }
                Some(Err(err)) => {
                    state
                        .pending
                        .push_back(Err(AgentRuntimeError::Stream(err.to_string())));
                    state.ended = true;
                }
                None => {
                    if let Some(frame) = mem::take(&mut state.decoder).finish() {
                        state.queue_frame(frame);
                    }
                    state.ended = true;
                }
            }
        }
    }))
}

#[derive(Debug, Clone)]
pub struct HttpAgentRuntime {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAgentRuntime {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::new(
            client,
            config.runtime_url.clone(),
            config.runtime_api_key.clone(),
        ))
    }

    fn query_url(&self) -> String {
        format!("{}/v1/query", self.base_url)
    }
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn start(&self, request: AgentRunRequest) -> Result<AgentEventStream, AgentRuntimeError> {
        let url = self.query_url();
        debug!(%url, max_turns = request.max_turns, "starting agent run");

        let mut builder = self
            .client
            .post(&url)
            .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| AgentRuntimeError::Connect(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentRuntimeError::Handshake {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_events(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::runtime::AgentOutcomeStatus;

    fn body(chunks: &[&str]) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send {
        let owned: Vec<Result<Vec<u8>, std::io::Error>> = chunks
            .iter()
            .map(|chunk| Ok(chunk.as_bytes().to_vec()))
            .collect();
        stream::iter(owned)
    }

    async fn collect(events: AgentEventStream) -> Vec<Result<AgentEvent, String>> {
        events
            .map(|item| item.map_err(|err| err.to_string()))
            .collect()
            .await
    }

    #[tokio::test]
    async fn decodes_text_tool_and_result_messages_split_across_chunks() {
        let events = decode_events(body(&[
            "data: {\"type\":\"system\",\"subtype\":\"init\"}\n\n",
            "data: {\"type\":\"stream_event\",\"event\":{\"type\":\"content_block_delta\",\"index\":0,",
            "\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}}\n\ndata: {\"type\":\"stream_event\",",
            "\"event\":{\"type\":\"content_block_start\",\"index\":1,\"content_block\":{\"type\":\"tool_use\",\"id\":\"t1\",\"name\":\"browser_navigate\",\"input\":{}}}}\n\n",
            "data: {\"type\":\"tool_progress\",\"tool_use_id\":\"t1\",\"tool_name\":\"browser_navigate\",\"elapsed_time_seconds\":1.5}\n\n",
            "data: {\"type\":\"stream_event\",\"event\":{\"type\":\"content_block_delta\",\"index\":2,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{}\"}}}\n\n",
            "data: {\"type\":\"result\",\"subtype\":\"success\",\"is_error\":false,\"num_turns\":3,\"total_cost_usd\":0.25,\"duration_ms\":1200}\n\n",
            "data: [DONE]\n\n",
            "data: {\"type\":\"stream_event\",\"event\":{\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"late\"}}}\n\n",
        ]));

        let mut outcome = AgentOutcome::success();
        outcome.num_turns = Some(3);
        outcome.cost_usd = Some(0.25);
        outcome.duration_ms = Some(1200.0);
        assert_eq!(
            collect(events).await,
            vec![
                Ok(AgentEvent::TextDelta("Hel".to_string())),
                Ok(AgentEvent::ToolStarted {
                    tool: "browser_navigate".to_string()
                }),
                Ok(AgentEvent::ToolProgress {
                    tool: "browser_navigate".to_string(),
                    elapsed_seconds: 1.5
                }),
                Ok(AgentEvent::Finished(outcome)),
            ]
        );
    }

    #[tokio::test]
    async fn non_success_result_becomes_failed_outcome() {
        let events = decode_events(body(&[
            "data: {\"type\":\"result\",\"subtype\":\"error_max_turns\",\"is_error\":true,\"num_turns\":30,\"errors\":[\"turn limit\"]}\n\n",
        ]));
        let items = collect(events).await;
        let [Ok(AgentEvent::Finished(outcome))] = items.as_slice() else {
            panic!("unexpected events: {items:?}");
        };
        assert_eq!(
            outcome.status,
            AgentOutcomeStatus::Failed {
                reason: "error_max_turns".to_string(),
                detail: Some("turn limit".to_string())
            }
        );
        assert_eq!(outcome.num_turns, Some(30));
    }

    #[tokio::test]
    async fn malformed_payload_ends_stream_with_decode_error() {
        let events = decode_events(body(&[
            "data: {\"type\":\"stream_event\",\"event\":{\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"ok\"}}}\n\n",
            "data: {not json}\n\n",
            "data: {\"type\":\"result\",\"subtype\":\"success\"}\n\n",
        ]));
        let items = collect(events).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(AgentEvent::TextDelta("ok".to_string())));
        assert!(items[1]
            .as_ref()
            .expect_err("decode error")
            .starts_with("agent runtime sent an undecodable message"));
    }

    #[tokio::test]
    async fn transport_error_is_reported_after_buffered_events() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"data: {\"type\":\"tool_progress\",\"tool_name\":\"t\",\"elapsed_time_seconds\":2}\n\n".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let items = collect(decode_events(stream::iter(chunks))).await;
        assert_eq!(
            items,
            vec![
                Ok(AgentEvent::ToolProgress {
                    tool: "t".to_string(),
                    elapsed_seconds: 2.0
                }),
                Err("agent runtime stream failed: reset".to_string()),
            ]
        );
    }

    #[test]
    fn query_url_tolerates_trailing_slash() {
        let runtime =
            HttpAgentRuntime::new(reqwest::Client::new(), "http://sidecar:8790/", None);
        assert_eq!(runtime.query_url(), "http://sidecar:8790/v1/query");
    }
}
