//! Handlers de vehículos

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateVehicleRequest, UpdateVehicleRequest, VehicleResponse},
    lifecycle::VehicleHolds,
    middleware::auth::AuthenticatedUser,
    models::{Vehicle, VehicleFilters},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/:id", get(get_vehicle).put(update_vehicle))
        .route("/:id/retire", post(retire_vehicle))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<VehicleResponse>>)> {
    request.validate()?;
    let vehicle = state.vehicles.create(&user, request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            VehicleResponse::new(vehicle, &VehicleHolds::new()),
            "Vehicle registered",
        )),
    ))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> AppResult<Json<ApiResponse<Vec<Vehicle>>>> {
    let vehicles = state.vehicles.list(&filters).await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VehicleResponse>>> {
    let vehicle = state.vehicles.get(id).await?;
    let holds = state.vehicles.holds(id).await?;
    Ok(Json(ApiResponse::success(VehicleResponse::new(vehicle, &holds))))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> AppResult<Json<ApiResponse<VehicleResponse>>> {
    request.validate()?;
    let vehicle = state.vehicles.update(&user, id, request.into()).await?;
    let holds = state.vehicles.holds(id).await?;

    Ok(Json(ApiResponse::success_with_message(
        VehicleResponse::new(vehicle, &holds),
        "Vehicle updated",
    )))
}

async fn retire_vehicle(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VehicleResponse>>> {
    let vehicle = state.vehicles.retire(&user, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        VehicleResponse::new(vehicle, &VehicleHolds::new()),
        "Vehicle retired",
    )))
}
