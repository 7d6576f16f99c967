//! Handlers de mantenimiento

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateMaintenanceRequest, MaintenanceStatusRequest},
    middleware::auth::AuthenticatedUser,
    models::{Maintenance, MaintenanceFilters},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_maintenance).post(create_maintenance))
        .route("/:id", get(get_maintenance))
        .route("/:id/status", post(change_maintenance_status))
}

async fn create_maintenance(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<CreateMaintenanceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Maintenance>>)> {
    request.validate()?;
    let record = state.maintenance.create(&user, request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(record, "Maintenance record created")),
    ))
}

async fn list_maintenance(
    State(state): State<AppState>,
    Query(filters): Query<MaintenanceFilters>,
) -> AppResult<Json<ApiResponse<Vec<Maintenance>>>> {
    Ok(Json(ApiResponse::success(state.maintenance.list(&filters).await?)))
}

async fn get_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Maintenance>>> {
    Ok(Json(ApiResponse::success(state.maintenance.get(id).await?)))
}

async fn change_maintenance_status(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<MaintenanceStatusRequest>,
) -> AppResult<Json<ApiResponse<Maintenance>>> {
    request.validate()?;
    let record = state.maintenance.change_status(&user, id, request.into()).await?;
    Ok(Json(ApiResponse::success(record)))
}
