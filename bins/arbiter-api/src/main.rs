mod handlers;
mod metrics;
mod routes;

use anyhow::{Context, Result};
use arbiter_common::Config;
use arbiter_judge::{Dispatcher, JsonProblemStore, Judge0Engine};
use axum::Router;
use redis::aio::ConnectionManager;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub struct AppState {
    pub redis: ConnectionManager,
    pub store: JsonProblemStore,
    pub dispatcher: Dispatcher<Judge0Engine>,
    /// Cancelled on shutdown; every synchronous evaluation runs under a child
    pub shutdown: CancellationToken,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received, cancelling in-flight evaluations");
    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Arbiter API booting...");

    let config = Config::from_env();
    metrics::init_metrics();

    let store = JsonProblemStore::load_from_file(Path::new(&config.problems_path))
        .with_context(|| format!("Failed to load problems from {}", config.problems_path))?;
    info!(problems = store.len(), path = %config.problems_path, "Problem store loaded");

    let engine = Judge0Engine::new(config.engine.clone()).context("Failed to build engine client")?;
    info!(
        engine_url = %config.engine.base_url,
        mode = ?config.engine.mode,
        max_concurrency = config.dispatch.max_concurrency,
        case_timeout_ms = config.dispatch.case_timeout_ms,
        "Execution engine configured"
    );

    let client = redis::Client::open(config.redis_url.as_str())
        .context("Failed to create Redis client")?;
    let redis_conn = ConnectionManager::new(client)
        .await
        .context("Failed to connect to Redis")?;
    info!("Connected to Redis: {}", config.redis_url);

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState {
        redis: redis_conn,
        store,
        dispatcher: Dispatcher::new(engine, config.dispatch.clone()),
        shutdown: shutdown.clone(),
    });

    let app = Router::new().merge(routes::routes()).with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    info!("Arbiter API stopped");
    Ok(())
}
