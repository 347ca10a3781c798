//! Request validation and prompt assembly for the agent endpoints.

use agent_stream_contract::{ChatMessage, ChatRole};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::runtime::{AgentRunRequest, McpServerConfig};

pub const DEFAULT_PROMPT_BUDGET_CHARS: usize = 48_000;

const BROWSER_SERVER_NAME: &str = "browser";

const CHAT_SYSTEM_PROMPT: &str = "You are a helpful assistant embedded in a desktop web app. \
Answer conversationally and concisely. Use Markdown only when it clearly helps.";

const CUSTOMER_RESEARCH_SYSTEM_PROMPT: &str = "You are a customer research analyst. \
Use the browser tools to visit the customer's public web presence, inspect the pages you load, \
and summarise who the customer is, what they sell, who they sell to, and any signals that \
matter for a sales conversation. Cite the pages you used. If a page cannot be loaded, say so \
and continue with what you have.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentEndpoint {
    Chat,
    CustomerResearch,
}

impl AgentEndpoint {
    pub fn name(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::CustomerResearch => "customer_research",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Chat => "/api/chat",
            Self::CustomerResearch => "/api/customer-research",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Chat => CHAT_SYSTEM_PROMPT,
            Self::CustomerResearch => CUSTOMER_RESEARCH_SYSTEM_PROMPT,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("Request body must be valid JSON")]
    InvalidJson,
    #[error("Request body must include a messages array")]
    MissingMessages,
    #[error("messages[{index}] must be an object")]
    MessageNotObject { index: usize },
    #[error("messages[{index}].content must be a string")]
    InvalidContent { index: usize },
    #[error("messages must include at least one user message")]
    NoUserMessage,
}

/// Parses and validates a `{ "messages": [...] }` body.
///
/// Entries whose role is neither `user` nor `assistant` are skipped.
pub fn parse_chat_request(body: &[u8]) -> Result<Vec<ChatMessage>, RequestValidationError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| RequestValidationError::InvalidJson)?;
    let entries = value
        .get("messages")
        .and_then(Value::as_array)
        .ok_or(RequestValidationError::MissingMessages)?;

    let mut messages = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let object = entry
            .as_object()
            .ok_or(RequestValidationError::MessageNotObject { index })?;
        let content = object
            .get("content")
            .and_then(Value::as_str)
            .ok_or(RequestValidationError::InvalidContent { index })?;
        let role_value = object.get("role").and_then(Value::as_str).unwrap_or("");
        let Some(role) = ChatRole::parse(role_value) else {
            debug!(index, role = role_value, "skipping message with unsupported role");
            continue;
        };
        messages.push(ChatMessage {
            role,
            content: content.to_string(),
        });
    }

    if !messages.iter().any(|m| m.role == ChatRole::User) {
        return Err(RequestValidationError::NoUserMessage);
    }
    Ok(messages)
}

fn format_turn(message: &ChatMessage) -> String {
    let speaker = match message.role {
        ChatRole::User => "User",
        ChatRole::Assistant => "Assistant",
    };
    format!("{speaker}: {}", message.content.trim())
}

/// Flattens the conversation into a prompt ending with the latest user turn.
///
/// Turns after the latest user message are dropped. When the result exceeds `budget_chars`
/// the oldest turns go first; the latest user turn is always kept.
pub fn build_prompt(messages: &[ChatMessage], budget_chars: usize) -> String {
    let Some(last_user) = messages.iter().rposition(|m| m.role == ChatRole::User) else {
        return String::new();
    };

    let turns: Vec<String> = messages[..=last_user].iter().map(format_turn).collect();
    let separator = "\n\n".len();
    let mut start = turns.len() - 1;
    let mut used = turns[start].chars().count();
    while start > 0 {
        let candidate = turns[start - 1].chars().count() + separator;
        if used + candidate > budget_chars {
            break;
        }
        used += candidate;
        start -= 1;
    }

    turns[start..].join("\n\n")
}

pub fn build_run_request(
    endpoint: AgentEndpoint,
    config: &Config,
    messages: &[ChatMessage],
) -> AgentRunRequest {
    let prompt = build_prompt(messages, DEFAULT_PROMPT_BUDGET_CHARS);
    match endpoint {
        AgentEndpoint::Chat => AgentRunRequest {
            system_prompt: endpoint.system_prompt().to_string(),
            prompt,
            max_turns: config.chat_max_turns,
            model: config.model.clone(),
            allowed_tools: Vec::new(),
            mcp_servers: Vec::new(),
        },
        AgentEndpoint::CustomerResearch => AgentRunRequest {
            system_prompt: endpoint.system_prompt().to_string(),
            prompt,
            max_turns: config.research_max_turns,
            model: config.model.clone(),
            allowed_tools: vec![format!("mcp__{BROWSER_SERVER_NAME}")],
            mcp_servers: vec![McpServerConfig {
                name: BROWSER_SERVER_NAME.to_string(),
                command: config.research_mcp_command.clone(),
                args: config.research_mcp_args.clone(),
            }],
        },
    }
}
