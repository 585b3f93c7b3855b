mod agent;
mod api;
mod config;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::agent::shoe_brand_agent;
use crate::config::Settings;
use crate::routes::AppState;
use shoe_core::{Brain, BrainConfig, Runner};
use shoe_tools::FaqLookup;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 1. Logging Setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Shoe Agent Gateway Initializing...");
    let settings = Settings::from_env()?;

    // 2. Initialize The Brain
    let brain = Arc::new(Brain::new(BrainConfig::from_env()?));
    if settings.startup_check {
        match brain.say_hello().await {
            Ok(msg) => info!("Brain Status: {}", msg),
            Err(e) => warn!("Brain is configured but unresponsive: {:#}", e),
        }
    }

    // 3. Build The Agent and its one tool
    let faq = FaqLookup::from_env()?;
    info!("FAQ lookup endpoint: {}", faq.url());
    let agent = Arc::new(shoe_brand_agent(faq));
    info!(
        "Agent '{}' ready with {} tool(s)",
        agent.name(),
        agent.tools().len()
    );

    // 4. Bundle State
    let runner = Arc::new(Runner::new(brain).with_max_turns(settings.max_turns));
    let state = AppState { runner, agent };

    // 5. Start Server
    let app = routes::router(state);
    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Gateway listening on {}...", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
