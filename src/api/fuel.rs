//! Handlers de repostajes

use axum::{
    extract::{Extension, Path, Query, State},
    routing::get,
    Json, Router,
};
use http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, RecordFuelRequest},
    middleware::auth::AuthenticatedUser,
    models::{FuelFilters, FuelTransaction},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_fuel_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_fuel_transactions).post(record_fuel))
        .route("/:id", get(get_fuel_transaction))
}

async fn record_fuel(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<RecordFuelRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<FuelTransaction>>)> {
    request.validate()?;
    let transaction = state.fuel.record(&user, request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(transaction, "Fuel transaction recorded")),
    ))
}

async fn list_fuel_transactions(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(filters): Query<FuelFilters>,
) -> AppResult<Json<ApiResponse<Vec<FuelTransaction>>>> {
    Ok(Json(ApiResponse::success(state.fuel.list(&user, filters).await?)))
}

async fn get_fuel_transaction(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FuelTransaction>>> {
    Ok(Json(ApiResponse::success(state.fuel.get(&user, id).await?)))
}
