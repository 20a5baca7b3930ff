//! Coordinator for the charging network.
//!
//! Ranks charging points for vehicles, brokers reservations and charging
//! sessions with each point's queue manager, and keeps the table of which
//! vehicle is charging where. A small read-only HTTP surface exposes that
//! table for operators.

mod config;
mod dispatch;
mod status;

pub use crate::config::{ConfigError, CoordinatorConfig, PointConfig};
pub use crate::dispatch::{Coordinator, DispatchError};

use axum::{Router, routing::get};
use chargeq_wire::{DispatchRequest, serve};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Create the status router
pub fn create_app(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/points", get(status::get_points))
        .route("/sessions", get(status::get_sessions))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

/// Serves client requests on `listener` until the process stops.
pub async fn run(listener: TcpListener, coordinator: Arc<Coordinator>) -> std::io::Result<()> {
    serve(listener, move |request: DispatchRequest| {
        let coordinator = coordinator.clone();
        async move { coordinator.handle(request).await }
    })
    .await
}
