mod handlers;
mod metrics;
mod routes;
mod store;
mod ws;

use axum::Router;
use std::sync::Arc;
use testit_engine::{EngineConfig, SessionRegistry};
use tokio::net::TcpListener;
use tracing::info;

use store::{InMemoryStore, ResultStore};

pub struct AppState {
    pub config: EngineConfig,
    pub registry: SessionRegistry,
    pub store: Arc<dyn ResultStore>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("TestIt API booting...");

    let config = EngineConfig::from_env();
    info!(
        scratch_root = %config.scratch_root.display(),
        batch_timeout_ms = config.batch_timeout_ms,
        interactive_timeout_ms = ?config.interactive_timeout_ms,
        "Execution engine configured"
    );

    let registry = SessionRegistry::new(config.clone());

    let state = Arc::new(AppState {
        config,
        registry,
        store: Arc::new(InMemoryStore::default()),
    });

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!("HTTP server listening on {}", addr);
    info!("Ready to accept jobs");

    axum::serve(listener, app).await.expect("Server error");
}
