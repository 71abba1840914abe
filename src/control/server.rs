//! HTTP control surface.
//!
//! Thin plumbing around [`super::RunController`]: toggling and querying
//! the run state, plus the Prometheus metrics and health routes. Every
//! route responds immediately; nothing here ever waits on the capture
//! loop.

use super::{RunController, StartOutcome};
use crate::metrics::PipelineMetrics;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

/// Errors that can occur during control server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the control server.
#[derive(Debug, Clone)]
pub struct ControlServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for ControlServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 5000).into(),
        }
    }
}

impl ControlServerConfig {
    /// Creates a config with a custom port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Shared state for the control routes.
struct ControlState {
    controller: Arc<RunController>,
    metrics: Arc<PipelineMetrics>,
}

/// Response body for the motion-state routes.
#[derive(Debug, Serialize)]
struct StateResponse {
    state: u8,
    msg: String,
}

/// HTTP server exposing the run-state control surface.
pub struct ControlServer {
    config: ControlServerConfig,
    state: Arc<ControlState>,
}

impl ControlServer {
    /// Creates a new control server.
    pub fn new(
        config: ControlServerConfig,
        controller: Arc<RunController>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            config,
            state: Arc::new(ControlState {
                controller,
                metrics,
            }),
        }
    }

    /// Starts the HTTP server.
    ///
    /// Runs until `shutdown` is notified.
    pub async fn run(self, shutdown: Arc<Notify>) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/api/motion-state", get(current_state_handler))
            .route("/api/motion-state/:state", put(set_state_handler))
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "control server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.notified().await })
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

/// Handler for `GET /api/motion-state`.
async fn current_state_handler(
    State(state): State<Arc<ControlState>>,
) -> impl IntoResponse {
    let code = state.controller.state().as_code();
    Json(StateResponse {
        state: code,
        msg: format!("Current state: {}", code),
    })
}

/// Handler for `PUT /api/motion-state/{0|1}`.
async fn set_state_handler(
    Path(target): Path<u8>,
    State(state): State<Arc<ControlState>>,
) -> impl IntoResponse {
    match target {
        0 => {
            let run = state.controller.stop();
            (
                StatusCode::OK,
                Json(StateResponse {
                    state: run.as_code(),
                    msg: "Process stopped".into(),
                }),
            )
        }
        1 => match state.controller.start() {
            StartOutcome::Started => (
                StatusCode::OK,
                Json(StateResponse {
                    state: 1,
                    msg: "Process started".into(),
                }),
            ),
            StartOutcome::AlreadyRunning => (
                StatusCode::OK,
                Json(StateResponse {
                    state: 1,
                    msg: "Process already running".into(),
                }),
            ),
            StartOutcome::Failed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StateResponse {
                    state: state.controller.state().as_code(),
                    msg: "Failed to start capture loop".into(),
                }),
            ),
        },
        _ => (
            StatusCode::BAD_REQUEST,
            Json(StateResponse {
                state: state.controller.state().as_code(),
                msg: "Unknown state, expected 0 or 1".into(),
            }),
        ),
    }
}

/// Handler for the `/metrics` endpoint.
async fn metrics_handler(State(state): State<Arc<ControlState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Handler for the `/health` endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ControlServerConfig::default();
        assert_eq!(config.bind_addr.port(), 5000);
    }

    #[test]
    fn test_config_with_port() {
        let config = ControlServerConfig::with_port(8080);
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
