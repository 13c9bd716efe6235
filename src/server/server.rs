use std::future::Future;

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{log_requests, state::ServerState, ServerConfig};

const GREETING: &str = "Hello, World!";

async fn home() -> &'static str {
    GREETING
}

pub fn make_app(config: ServerConfig) -> Router {
    let state = ServerState::new(config);

    Router::new()
        .route("/", get(home))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

/// Serves on an already bound `listener` until `shutdown` resolves, then
/// drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = make_app(config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Resolves when `signal` fires. A signal that cannot be listened for never
/// resolves, so the server keeps running instead of stopping at once.
pub async fn shutdown_on<S>(signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => {
            warn!("Failed to listen for shutdown signal, serving until killed: {}", err);
            std::future::pending::<()>().await
        }
    }
}

pub async fn run_server<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = config.port;
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);
    println!("Server is running on port {}...", port);

    serve(listener, config, shutdown).await?;
    info!("Server stopped");
    Ok(())
}
