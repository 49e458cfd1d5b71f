//! Health check endpoint.

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /health - liveness plus a database ping.
pub async fn check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = if state.db.health_check().await {
        "up"
    } else {
        "down"
    };

    Json(serde_json::json!({
        "status": "ok",
        "database": database,
    }))
}
