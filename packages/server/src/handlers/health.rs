use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::warn;

use crate::database::ping_with_timeout;
use crate::models::health::HealthResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Database liveness check",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let timeout = Duration::from_millis(state.config.database.health_timeout_ms);
    match ping_with_timeout(&state.db, timeout).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".into(),
                time: Some(Utc::now()),
                error: None,
            }),
        ),
        Err(error) => {
            warn!(%error, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".into(),
                    time: None,
                    error: Some(error),
                }),
            )
        }
    }
}
