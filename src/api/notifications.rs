//! Handlers de notificaciones del usuario actual

use axum::{
    extract::{Extension, Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::{
    dto::{ApiResponse, MarkReadRequest, MarkReadResponse, NotificationQuery},
    middleware::auth::AuthenticatedUser,
    models::Notification,
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read", post(mark_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = state.notifications.list_for_user(&user, query.unread_only).await?;
    Ok(Json(ApiResponse::success(notifications)))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    request: Option<Json<MarkReadRequest>>,
) -> AppResult<Json<ApiResponse<MarkReadResponse>>> {
    let Json(request) = request.unwrap_or_default();
    let marked = state.notifications.mark_read(&user, request.ids).await?;
    Ok(Json(ApiResponse::success(MarkReadResponse { marked })))
}
