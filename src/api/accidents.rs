//! Handlers de accidentes

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{AccidentStatusRequest, ApiResponse, ReportAccidentRequest},
    middleware::auth::AuthenticatedUser,
    models::{Accident, AccidentFilters},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_accident_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accidents).post(report_accident))
        .route("/:id", get(get_accident))
        .route("/:id/status", post(change_accident_status))
}

async fn report_accident(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<ReportAccidentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Accident>>)> {
    request.validate()?;
    let accident = state.accidents.report(&user, request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(accident, "Accident reported")),
    ))
}

async fn list_accidents(
    State(state): State<AppState>,
    Query(filters): Query<AccidentFilters>,
) -> AppResult<Json<ApiResponse<Vec<Accident>>>> {
    Ok(Json(ApiResponse::success(state.accidents.list(&filters).await?)))
}

async fn get_accident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Accident>>> {
    Ok(Json(ApiResponse::success(state.accidents.get(id).await?)))
}

async fn change_accident_status(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AccidentStatusRequest>,
) -> AppResult<Json<ApiResponse<Accident>>> {
    request.validate()?;
    let accident = state.accidents.change_status(&user, id, request.into()).await?;
    Ok(Json(ApiResponse::success(accident)))
}
