use std::sync::Arc;

use agent_proxy::{build_router, logging::init_logging, AppState, Config, HttpAgentRuntime};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_logging(&config.log_filter, config.log_format)?;

    let runtime = HttpAgentRuntime::from_config(&config).context("failed to build HTTP client")?;
    let bind_addr = config.bind_addr;
    info!(
        %bind_addr,
        runtime_url = %config.runtime_url,
        static_dir = ?config.static_dir,
        "agent proxy starting"
    );

    let app = build_router(AppState::new(config, Arc::new(runtime)));
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("agent proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
