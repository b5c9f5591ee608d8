//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let (status, database) = match &state.db_pool {
        Some(pool) => match pool.ping().await {
            Ok(()) => ("ok", "postgres"),
            Err(e) => {
                warn!(error = %e, "Health check could not reach the database");
                ("degraded", "postgres-unreachable")
            }
        },
        None => ("ok", "memory"),
    };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        ws_connections: state.realtime.registry.connection_count(),
        online_users: state.realtime.registry.user_count(),
    }))
}
