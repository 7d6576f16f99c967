//! Handlers de informes (gestores de flota)

use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};

use crate::{
    dto::ApiResponse,
    middleware::auth::AuthenticatedUser,
    services::{DataQualityReport, FleetStatusReport},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_report_router() -> Router<AppState> {
    Router::new()
        .route("/fleet-status", get(fleet_status))
        .route("/data-quality", get(data_quality))
}

async fn fleet_status(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse<FleetStatusReport>>> {
    Ok(Json(ApiResponse::success(state.reports.fleet_status(&user).await?)))
}

async fn data_quality(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse<DataQualityReport>>> {
    Ok(Json(ApiResponse::success(state.reports.data_quality(&user).await?)))
}
