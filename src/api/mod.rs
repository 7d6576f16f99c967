//! API endpoints
//!
//! Este módulo contiene los handlers HTTP y el router principal.

pub mod accidents;
pub mod auth;
pub mod documents;
pub mod fuel;
pub mod health;
pub mod maintenance;
pub mod notifications;
pub mod reports;
pub mod trips;
pub mod users;
pub mod vehicles;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{auth::auth_middleware, auth::fleet_manager_middleware, cors::cors_layer};
use crate::state::AppState;

/// Crear el router completo de la aplicación
pub fn create_router(state: AppState) -> Router {
    // Rutas solo para gestores de flota
    let management = Router::new()
        .nest("/users", users::create_user_router())
        .nest("/reports", reports::create_report_router())
        .route_layer(from_fn(fleet_manager_middleware));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/vehicles", vehicles::create_vehicle_router())
        .nest("/trips", trips::create_trip_router())
        .nest("/maintenance", maintenance::create_maintenance_router())
        .nest("/accidents", accidents::create_accident_router())
        .nest("/fuel", fuel::create_fuel_router())
        .nest("/documents", documents::create_document_router())
        .nest("/notifications", notifications::create_notification_router())
        .merge(management)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new().route("/auth/login", post(auth::login)).merge(protected);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}
