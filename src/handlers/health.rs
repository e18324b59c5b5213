use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

/// Liveness plus a database ping. Unauthenticated by design; load balancers
/// hit this.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "database": "reachable"})),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "degraded", "database": e.to_string()})),
        ),
    }
}
