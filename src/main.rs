use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use tracing::info;

use bauplan_explorer::api;
use bauplan_explorer::api::handlers::AppState;
use bauplan_explorer::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Catalog at {}, staging projects under {}",
        config.catalog.url,
        config.workspace.root.display()
    );

    tokio::fs::create_dir_all(&config.workspace.root)
        .await
        .with_context(|| {
            format!(
                "Failed to create workspace directory {}",
                config.workspace.root.display()
            )
        })?;

    let state = AppState::from_config(config.clone()).context("Failed to initialize catalog client")?;

    // Create router with state
    let app: Router = api::routes::create_router_with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server_address()
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server_address()))?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
