//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout)
//! - Bind server to listener
//! - Stop on the shared shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{DisplayMode, SimulatorConfig};
use crate::http::handlers::{get_exceeding, get_health, get_metrics};
use crate::register::MetricsRegister;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub register: Arc<MetricsRegister>,
    pub metric_name: Arc<str>,
    pub display_mode: DisplayMode,
    pub top_k: usize,
}

impl AppState {
    pub fn new(register: Arc<MetricsRegister>, config: &SimulatorConfig) -> Self {
        Self {
            register,
            metric_name: Arc::from(config.generator.metric_name.as_str()),
            display_mode: config.display.mode,
            top_k: config.exceedance.top_k,
        }
    }
}

/// HTTP front end over a shared register.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(register: Arc<MetricsRegister>, config: &SimulatorConfig) -> Self {
        let state = AppState::new(register, config);
        let timeout = Duration::from_secs(config.server.request_timeout_secs);
        Self {
            router: Self::build_router(state, timeout),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/metrics", get(get_metrics))
            .route("/exceeding", get(get_exceeding))
            .route("/health", get(get_health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
