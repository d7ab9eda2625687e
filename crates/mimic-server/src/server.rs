//! HTTP server lifecycle management.
//!
//! Provides [`start_server`], which binds a TCP port and serves the
//! router until `Ctrl-C` is received, and [`spawn_server`], which serves
//! on a background task and reports the bound address.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::router::build_router;
use crate::state::AppState;

/// Where the server listens.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on. `0` picks a free port.
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Start the mock server and serve until `Ctrl-C`.
///
/// In-flight requests finish before the function returns.
///
/// # Errors
///
/// Returns [`StartupError`] if the listener cannot bind or serving fails.
pub async fn start_server(listen: &ListenConfig, state: Arc<AppState>) -> Result<(), StartupError> {
    let listener = bind(listen).await?;
    serve(listener, state, shutdown_signal()).await
}

/// Bind eagerly and serve on a background Tokio task.
///
/// Returns the bound address (useful with port `0`) and the task handle.
/// The server runs until the task is aborted or the runtime shuts down.
///
/// # Errors
///
/// Returns [`StartupError::Bind`] if the listener cannot bind.
pub async fn spawn_server(
    listen: &ListenConfig,
    state: Arc<AppState>,
) -> Result<(SocketAddr, JoinHandle<()>), StartupError> {
    let listener = bind(listen).await?;
    let addr = local_addr(&listener)?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state, std::future::pending::<()>()).await {
            error!(error = %e, "Mock server exited with error");
        }
    });

    Ok((addr, handle))
}

async fn bind(listen: &ListenConfig) -> Result<TcpListener, StartupError> {
    TcpListener::bind((listen.host.as_str(), listen.port))
        .await
        .map_err(|e| StartupError::Bind(format!("bind failed on {}:{}: {e}", listen.host, listen.port)))
}

fn local_addr(listener: &TcpListener) -> Result<SocketAddr, StartupError> {
    listener
        .local_addr()
        .map_err(|e| StartupError::Bind(format!("no local address: {e}")))
}

async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), StartupError> {
    let addr = local_addr(&listener)?;
    let router = build_router(state);

    info!(%addr, "Mock server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StartupError::Serve(format!("serve error: {e}")))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
