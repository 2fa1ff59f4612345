//! HTTP surface of the vision service.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::classifier::ImagePredictor;

pub use error::{ApiError, ApiResult};

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "SwiftTrust Vision";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn ImagePredictor>,
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(predictor: Arc<dyn ImagePredictor>) -> Self {
        Self {
            predictor,
            service_name: Arc::from(SERVICE_NAME),
        }
    }
}

/// Create the router with the health and prediction routes
pub fn create_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

/// Binds `addr` and serves `router` until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Vision service listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
