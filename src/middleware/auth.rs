//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y verificación de usuarios autenticados.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::debug;

use crate::{
    models::User,
    state::AppState,
    utils::errors::AppError,
    utils::jwt::{extract_token_from_header, verify_token},
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;
    let token = extract_token_from_header(auth_header)?;

    let claims = verify_token(token, &state.jwt)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    let user_id = claims.user_id()?;

    // El usuario debe seguir existiendo y poder entrar
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    if !user.can_login() {
        return Err(AppError::Unauthorized("User is inactive or not approved".to_string()));
    }

    debug!("🔐 {} ({}) → {}", user.username, user.user_type.as_str(), request.uri().path());
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

/// Middleware para rutas de gestión de flota
pub async fn fleet_manager_middleware(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.user_type.is_fleet_manager() {
        return Err(AppError::Forbidden("Fleet manager permissions required".to_string()));
    }

    Ok(next.run(request).await)
}
