//! Handlers de usuarios (gestores de flota)

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    dto::ApiResponse,
    middleware::auth::AuthenticatedUser,
    models::{User, UserFilters},
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user))
        .route("/:id/approve", post(approve_user))
        .route("/:id/reject", post(reject_user))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(filters): Query<UserFilters>,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    Ok(Json(ApiResponse::success(state.users.list(&user, &filters).await?)))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(ApiResponse::success(state.users.get(id).await?)))
}

async fn approve_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let approved = state.users.approve(&user, id).await?;
    Ok(Json(ApiResponse::success_with_message(approved, "Driver approved")))
}

async fn reject_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let rejected = state.users.reject(&user, id).await?;
    Ok(Json(ApiResponse::success_with_message(rejected, "Driver rejected")))
}
