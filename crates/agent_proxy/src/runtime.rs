//! Interface to the external agent runtime.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use thiserror::Error;

/// Tool server the agent runtime launches for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRunRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub max_turns: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServerConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcomeStatus {
    Success,
    /// Non-success result; `reason` is the runtime's result subtype.
    Failed {
        reason: String,
        detail: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    pub status: AgentOutcomeStatus,
    pub num_turns: Option<u32>,
    pub cost_usd: Option<f64>,
    pub duration_ms: Option<f64>,
}

impl AgentOutcome {
    pub fn success() -> Self {
        Self {
            status: AgentOutcomeStatus::Success,
            num_turns: None,
            cost_usd: None,
            duration_ms: None,
        }
    }

    pub fn failed(reason: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status: AgentOutcomeStatus::Failed {
                reason: reason.into(),
                detail,
            },
            ..Self::success()
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, AgentOutcomeStatus::Success)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    TextDelta(String),
    ToolStarted { tool: String },
    ToolProgress { tool: String, elapsed_seconds: f64 },
    Finished(AgentOutcome),
}

#[derive(Debug, Error)]
pub enum AgentRuntimeError {
    #[error("agent runtime unreachable: {0}")]
    Connect(String),
    #[error("agent runtime rejected the run with status {status}: {body}")]
    Handshake { status: u16, body: String },
    #[error("agent runtime stream failed: {0}")]
    Stream(String),
    #[error("agent runtime sent an undecodable message: {0}")]
    Decode(String),
}

pub type AgentEventStream =
    Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentRuntimeError>> + Send + 'static>>;

/// Starts agent runs. Dropping the returned stream abandons the run.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn start(&self, request: AgentRunRequest) -> Result<AgentEventStream, AgentRuntimeError>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn run_request_omits_empty_optional_fields() {
        let request = AgentRunRequest {
            system_prompt: "sys".to_string(),
            prompt: "User: hi".to_string(),
            max_turns: 8,
            model: None,
            allowed_tools: Vec::new(),
            mcp_servers: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({"system_prompt": "sys", "prompt": "User: hi", "max_turns": 8})
        );
    }

    #[test]
    fn failed_outcome_keeps_reason() {
        let outcome = AgentOutcome::failed("error_max_turns", None);
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.status,
            AgentOutcomeStatus::Failed {
                reason: "error_max_turns".to_string(),
                detail: None
            }
        );
    }
}
