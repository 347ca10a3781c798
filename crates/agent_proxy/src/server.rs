use std::sync::Arc;

use agent_stream_contract::EVENT_STREAM_CONTENT_TYPE;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderMap,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Instrument};

use crate::{
    config::Config,
    error::ApiError,
    prompt::{build_run_request, parse_chat_request, AgentEndpoint},
    relay::SseRelay,
    runtime::AgentRuntime,
    telemetry::{Telemetry, TelemetrySnapshot},
};


const SERVICE_NAME: &str = "agent_proxy";
const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runtime: Arc<dyn AgentRuntime>,
    pub telemetry: Arc<Telemetry>,
}

impl AppState {
    pub fn new(config: Config, runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            config: Arc::new(config),
            runtime,
            telemetry: Arc::new(Telemetry::new()),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/healthz", get(health))
        .route("/api/telemetry", get(telemetry_snapshot))
        .route(AgentEndpoint::Chat.path(), post(chat))
        .route(AgentEndpoint::CustomerResearch.path(), post(customer_research))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn telemetry_snapshot(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    Json(state.telemetry.snapshot())
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    run_agent(state, AgentEndpoint::Chat, &headers, body).await
}

async fn customer_research(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    run_agent(state, AgentEndpoint::CustomerResearch, &headers, body).await
}

async fn run_agent(
    state: AppState,
    endpoint: AgentEndpoint,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let span = info_span!("agent.request", endpoint = endpoint.name(), %request_id);

    async move {
        state.telemetry.record_request();

        let messages = parse_chat_request(&body).map_err(|err| {
            state.telemetry.record_validation_failure();
            warn!(error = %err, "rejected agent request");
            ApiError::from(err)
        })?;

        let run_request = build_run_request(endpoint, &state.config, &messages);
        let prompt_chars = run_request.prompt.chars().count();
        state.telemetry.record_prompt(endpoint, prompt_chars);
        info!(
            messages = messages.len(),
            prompt_chars,
            max_turns = run_request.max_turns,
            "starting agent run"
        );

        let events = state.runtime.start(run_request).await.map_err(|err| {
            state.telemetry.record_start_failure();
            error!(error = %err, "failed to start agent run");
            ApiError::Internal
        })?;

        let relay = SseRelay::new(
            endpoint,
            events,
            Arc::clone(&state.telemetry),
            info_span!("agent.stream", endpoint = endpoint.name()),
        );
        Ok((
            [
                (CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
                (CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(relay),
        )
            .into_response())
    }
    .instrument(span)
    .await
}
