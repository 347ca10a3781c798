//! Re-encodes agent events as the SSE frames sent to the browser.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use agent_stream_contract::{encode_done_frame, encode_event_frame, StreamEvent};
use futures::Stream;
use tracing::{error, info, warn, Span};

use crate::prompt::AgentEndpoint;
use crate::runtime::{AgentEvent, AgentEventStream, AgentOutcome, AgentOutcomeStatus};
use crate::telemetry::{StreamOutcome, Telemetry};

pub const STREAM_ERROR_MESSAGE: &str = "The agent stream failed unexpectedly";

/// Response body for one agent run.
///
/// Always ends with an `error` or `done` event followed by `[DONE]`, even when the runtime
/// stream fails. Dropping it before then counts as a client cancellation and drops the
/// runtime stream with it.
pub struct SseRelay {
    endpoint: AgentEndpoint,
    events: AgentEventStream,
    telemetry: Arc<Telemetry>,
    span: Span,
    started: Instant,
    pending: VecDeque<String>,
    outcome: Option<StreamOutcome>,
}

impl SseRelay {
    pub fn new(
        endpoint: AgentEndpoint,
        events: AgentEventStream,
        telemetry: Arc<Telemetry>,
        span: Span,
    ) -> Self {
        Self {
            endpoint,
            events,
            telemetry,
            span,
            started: Instant::now(),
            pending: VecDeque::new(),
            outcome: None,
        }
    }

    fn push(&mut self, event: &StreamEvent) {
        self.pending.push_back(encode_event_frame(event));
    }

    fn handle(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::TextDelta(text) => {
                self.telemetry.record_text(text.chars().count());
                self.push(&StreamEvent::TextDelta { text });
            }
            AgentEvent::ToolStarted { tool } => {
                self.telemetry.record_tool_call();
                info!(%tool, "agent tool started");
                self.push(&StreamEvent::ToolStart { tool });
            }
            AgentEvent::ToolProgress {
                tool,
                elapsed_seconds,
            } => self.push(&StreamEvent::ToolProgress {
                tool,
                elapsed: elapsed_seconds,
            }),
            AgentEvent::Finished(outcome) => self.complete(outcome),
        }
    }

    fn complete(&mut self, outcome: AgentOutcome) {
        let duration_ms = outcome
            .duration_ms
            .unwrap_or_else(|| self.started.elapsed().as_secs_f64() * 1000.0);
        self.telemetry
            .record_run(self.endpoint, duration_ms, outcome.num_turns, outcome.cost_usd);

        match outcome.status {
            AgentOutcomeStatus::Success => {
                info!(
                    duration_ms,
                    num_turns = outcome.num_turns,
                    cost_usd = outcome.cost_usd,
                    "agent run completed"
                );
                self.push(&StreamEvent::Done);
            }
            AgentOutcomeStatus::Failed { reason, detail } => {
                warn!(%reason, detail = detail.as_deref(), duration_ms, "agent run failed");
                self.push(&StreamEvent::Error {
                    message: format!("The agent could not complete the request ({reason})"),
                });
            }
        }
        self.close(StreamOutcome::Completed);
    }

    fn fail(&mut self, detail: &str) {
        error!(%detail, "agent stream failed");
        self.push(&StreamEvent::Error {
            message: STREAM_ERROR_MESSAGE.to_string(),
        });
        self.close(StreamOutcome::Failed);
    }

    fn close(&mut self, outcome: StreamOutcome) {
        self.pending.push_back(encode_done_frame());
        self.outcome = Some(outcome);
        self.telemetry.record_stream_end(outcome);
    }
}

impl Stream for SseRelay {
    type Item = Result<String, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let span = this.span.clone();
        let _entered = span.enter();

        loop {
            if let Some(frame) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }
            if this.outcome.is_some() {
                return Poll::Ready(None);
            }
            match this.events.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(event))) => this.handle(event),
                Poll::Ready(Some(Err(err))) => this.fail(&err.to_string()),
                Poll::Ready(None) => this.fail("runtime stream ended without a result"),
            }
        }
    }
}

impl Drop for SseRelay {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            let _entered = self.span.enter();
            info!(
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "client disconnected before the agent finished"
            );
            self.telemetry.record_stream_end(StreamOutcome::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::{stream, StreamExt};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::runtime::AgentRuntimeError;

    fn relay(
        items: Vec<Result<AgentEvent, AgentRuntimeError>>,
        telemetry: &Arc<Telemetry>,
    ) -> SseRelay {
        SseRelay::new(
            AgentEndpoint::Chat,
            Box::pin(stream::iter(items)),
            Arc::clone(telemetry),
            Span::none(),
        )
    }

    async fn frames(relay: SseRelay) -> Vec<String> {
        relay
            .map(|frame| match frame {
                Ok(frame) => frame,
                Err(never) => match never {},
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn successful_run_ends_with_done_event_and_sentinel() {
        let telemetry = Arc::new(Telemetry::new());
        let output = frames(relay(
            vec![
                Ok(AgentEvent::TextDelta("Hi".to_string())),
                Ok(AgentEvent::Finished(AgentOutcome::success())),
            ],
            &telemetry,
        ))
        .await;

        assert_eq!(
            output,
            vec![
                "data: {\"type\":\"text_delta\",\"text\":\"Hi\"}\n\n".to_string(),
                "data: {\"type\":\"done\"}\n\n".to_string(),
                "data: [DONE]\n\n".to_string(),
            ]
        );
        assert_eq!(telemetry.counter("agent.text_chars"), 2);
        assert_eq!(telemetry.counter("agent.stream_errors"), 0);
        assert_eq!(telemetry.counter("agent.stream_cancelled"), 0);
    }

    #[tokio::test]
    async fn upstream_end_without_result_is_reported_as_generic_error() {
        let telemetry = Arc::new(Telemetry::new());
        let output = frames(relay(
            vec![Ok(AgentEvent::ToolStarted {
                tool: "browser_navigate".to_string(),
            })],
            &telemetry,
        ))
        .await;

        assert_eq!(output.len(), 3);
        assert_eq!(
            output[1],
            format!("data: {{\"type\":\"error\",\"message\":\"{STREAM_ERROR_MESSAGE}\"}}\n\n")
        );
        assert_eq!(output[2], "data: [DONE]\n\n");
        assert_eq!(telemetry.counter("agent.tool_calls"), 1);
        assert_eq!(telemetry.counter("agent.stream_errors"), 1);
    }

    #[tokio::test]
    async fn events_after_failure_are_not_forwarded() {
        let telemetry = Arc::new(Telemetry::new());
        let output = frames(relay(
            vec![
                Err(AgentRuntimeError::Stream("connection reset".to_string())),
                Ok(AgentEvent::TextDelta("late".to_string())),
            ],
            &telemetry,
        ))
        .await;

        assert_eq!(output.len(), 2);
        assert!(!output[0].contains("connection reset"));
        assert_eq!(telemetry.counter("agent.text_chars"), 0);
    }

    #[test]
    fn dropping_an_unfinished_relay_counts_as_cancelled() {
        let telemetry = Arc::new(Telemetry::new());
        drop(relay(
            vec![Ok(AgentEvent::TextDelta("partial".to_string()))],
            &telemetry,
        ));
        assert_eq!(telemetry.counter("agent.stream_cancelled"), 1);
        assert_eq!(telemetry.counter("agent.stream_errors"), 0);
    }
}
