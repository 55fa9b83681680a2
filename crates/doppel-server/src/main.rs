//! doppel HTTP Server
//!
//! Axum-based server exposing the decision engine over a small REST API.
//! Tools and the data sources they query are loaded from the JSON file named
//! by `DOPPEL_TOOLS_FILE`.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doppel_core::{DecisionEngine, ToolRegistry};
use doppel_runtime::PrefixResolver;

use crate::config::{Catalog, ServerConfig, ToolsFile};
use crate::handlers::{decide, health_check, list_tools};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    // Model providers are resolved per request from the model name
    let resolver = PrefixResolver::from_env()?;
    let providers = resolver.config();
    if providers.openai_api_key.is_none() && providers.anthropic_api_key.is_none() {
        tracing::warn!("No provider credentials configured - every decision will fail");
        tracing::warn!("  Set OPENAI_API_KEY and/or ANTHROPIC_API_KEY in .env");
    }

    // Load tools
    let mut catalog = match &config.tools_file {
        Some(path) => ToolsFile::load(path)?.build().await?,
        None => {
            tracing::warn!("DOPPEL_TOOLS_FILE not set - serving without tools");
            Catalog::default()
        }
    };

    let tools = Arc::new(ToolRegistry::new());
    for tool in catalog.tools.drain(..) {
        tools.register(tool)?;
    }

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let engine = DecisionEngine::builder()
        .resolver(resolver)
        .registry(tools)
        .config(config.engine_config())
        .build()?;

    let state = AppState {
        engine: Arc::new(engine),
        default_model: config.default_model.as_str().into(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/decide", post(decide))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("doppel server running on http://{}", config.bind_addr);
    tracing::info!("  GET  /health      - Health check");
    tracing::info!("  GET  /api/tools   - Tool catalog");
    tracing::info!("  POST /api/decide  - Run a decision");
    tracing::info!("  default model: {}", config.default_model);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, closing data sources");
    catalog.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
