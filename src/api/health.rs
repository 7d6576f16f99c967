use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check sin autenticación
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "fleet_management",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
