//! HTTP trigger surface
//!
//! The Functions host authenticates the caller (function-level key) and
//! forwards the trigger request to this custom handler. Method, query and
//! body are ignored; every request runs the task once and answers in plain
//! text.

use crate::config::ServerConfig;
use crate::task::IngestTask;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Route the host forwards the `generate_json` trigger to.
pub const GENERATE_JSON_ROUTE: &str = "/api/generate_json";

#[derive(Clone)]
pub struct AppState {
    pub task: Arc<IngestTask>,
}

impl AppState {
    pub fn new(task: IngestTask) -> Self {
        Self {
            task: Arc::new(task),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(GENERATE_JSON_ROUTE, any(generate_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn generate_json(State(state): State<AppState>) -> Response {
    match state.task.run().await {
        Ok(report) => (StatusCode::OK, report.message()).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

/// Listen until Ctrl-C or SIGTERM
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Custom handler listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Custom handler shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        }
    };

    // The Functions host stops a custom handler with SIGTERM
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
