//! HTTP Server
//!
//! Accepts posted calls and hands each body to the request processor on the
//! blocking pool.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::Result;
use super::RequestProcessor;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    processor: Arc<RequestProcessor>,
}

/// HTTP server for Riposte calls
pub struct RiposteServer {
    config: ServerConfig,
    processor: Arc<RequestProcessor>,
}

impl RiposteServer {
    /// Create a new server with the given config and processor
    pub fn new(config: ServerConfig, processor: RequestProcessor) -> Self {
        Self {
            config,
            processor: Arc::new(processor),
        }
    }

    pub fn processor(&self) -> &Arc<RequestProcessor> {
        &self.processor
    }

    /// Build the router: the call route (POST and GET) plus `/health`
    pub fn router(&self) -> Router {
        let state = AppState {
            processor: Arc::clone(&self.processor),
        };

        Router::new()
            .route(&self.config.path, get(handle_call).post(handle_call))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::max(self.config.max_payload_size))
            .with_state(state)
    }

    /// Bind the configured listen address
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        Ok(listener)
    }

    /// Serve on `listener` until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, path = %self.config.path, "Serving Riposte calls");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Riposte server stopped");
        Ok(())
    }

    /// Bind and serve until Ctrl+C (blocking the current task)
    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        })
        .await
    }
}

async fn handle_call(State(state): State<AppState>, body: Bytes) -> Response {
    let processor = Arc::clone(&state.processor);
    match tokio::task::spawn_blocking(move || processor.process(&body)).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Call processing task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health_check() -> &'static str {
    "ok"
}
