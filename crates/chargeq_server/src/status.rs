use crate::config::PointConfig;
use crate::dispatch::Coordinator;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsStatus {
    /// Point id to the vehicle charging there
    pub sessions: BTreeMap<String, String>,
}

/// Get the configured charging points
pub async fn get_points(State(coordinator): State<Arc<Coordinator>>) -> Json<Vec<PointConfig>> {
    tracing::info!("Getting configured charging points");
    Json(coordinator.points())
}

/// Get the active charging sessions
pub async fn get_sessions(State(coordinator): State<Arc<Coordinator>>) -> Json<SessionsStatus> {
    tracing::info!("Getting active sessions");
    Json(SessionsStatus {
        sessions: coordinator.sessions(),
    })
}
