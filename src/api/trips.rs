//! Handlers de viajes

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CancelTripRequest, EndTripRequest, StartTripRequest, TripResponse},
    middleware::auth::AuthenticatedUser,
    models::TripFilters,
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(start_trip))
        .route("/:id", get(get_trip))
        .route("/:id/end", post(end_trip))
        .route("/:id/cancel", post(cancel_trip))
}

async fn start_trip(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<StartTripRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TripResponse>>)> {
    request.validate()?;
    let trip = state.trips.start_trip(&user, request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(TripResponse::from(trip), "Trip started")),
    ))
}

async fn list_trips(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(filters): Query<TripFilters>,
) -> AppResult<Json<ApiResponse<Vec<TripResponse>>>> {
    let trips = state.trips.list(&user, filters).await?;
    Ok(Json(ApiResponse::success(
        trips.into_iter().map(TripResponse::from).collect(),
    )))
}

async fn get_trip(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TripResponse>>> {
    let trip = state.trips.get(&user, id).await?;
    Ok(Json(ApiResponse::success(TripResponse::from(trip))))
}

async fn end_trip(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<EndTripRequest>,
) -> AppResult<Json<ApiResponse<TripResponse>>> {
    request.validate()?;
    let trip = state
        .trips
        .end_trip(&user, id, request.end_odometer, request.notes)
        .await?;

    Ok(Json(ApiResponse::success_with_message(TripResponse::from(trip), "Trip completed")))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    request: Option<Json<CancelTripRequest>>,
) -> AppResult<Json<ApiResponse<TripResponse>>> {
    let Json(request) = request.unwrap_or_default();
    request.validate()?;
    let trip = state.trips.cancel_trip(&user, id, request.reason).await?;

    Ok(Json(ApiResponse::success_with_message(TripResponse::from(trip), "Trip cancelled")))
}
