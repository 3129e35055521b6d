//! Liveness and health endpoints.

use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AppState, HealthResponse, PingResponse};

/// `GET /v1/ping`
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { ping: "pong" })
}

/// `GET /v1/healthcheck`
///
/// Always 200; a failing database probe is reported in the body.
pub async fn healthcheck(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.store().ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: "available",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
