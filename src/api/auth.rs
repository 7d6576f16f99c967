//! Handlers de autenticación
//!
//! Login contra cuentas locales o el sistema de RRHH y consulta del
//! usuario actual.

use axum::{
    extract::{Extension, State},
    Json,
};
use validator::Validate;

use crate::{
    dto::{ApiResponse, LoginRequest, LoginResponse},
    middleware::auth::AuthenticatedUser,
    models::User,
    services::Credentials,
    state::AppState,
    utils::errors::AppResult,
};

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    request.validate()?;
    let credentials = Credentials::from(request);
    let outcome = state.auth.login(&credentials).await?;

    Ok(Json(ApiResponse::success_with_message(
        LoginResponse {
            access_token: outcome.token,
            token_type: outcome.token_type.to_string(),
            expires_in: outcome.expires_in,
            user: outcome.user,
        },
        "Login successful",
    )))
}

pub async fn me(Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}
