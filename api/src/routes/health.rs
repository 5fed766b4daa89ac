use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub const SERVER_DISPLAY_NAME: &str = "LoanPro MCP Server";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(server_info))
        .route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub transport: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub transport: &'static str,
}

pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(ServerInfo {
        name: SERVER_DISPLAY_NAME,
        version: env!("CARGO_PKG_VERSION"),
        transport: state.transport.as_str(),
    })
}

/// Liveness only; the upstream API is not probed.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        transport: state.transport.as_str(),
    })
}
