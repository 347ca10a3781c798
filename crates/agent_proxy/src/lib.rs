//! HTTP front door for the agent desktop: validates conversations, forwards them to the agent
//! runtime sidecar, and relays the run back to the browser as server-sent events.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod relay;
pub mod runtime;
pub mod server;
pub mod sidecar;
pub mod telemetry;

pub use config::{Config, ConfigError, LogFormat};
pub use runtime::{AgentEvent, AgentRunRequest, AgentRuntime, AgentRuntimeError};
pub use server::{build_router, AppState};
pub use sidecar::HttpAgentRuntime;
