//! Gestión de flota
//!
//! Vehículos, viajes, mantenimiento y accidentes con un ciclo de vida de
//! vehículo consistente bajo concurrencia.

pub mod api;
pub mod config;
pub mod database;
pub mod dto;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod utils;

pub use api::create_router;
pub use state::AppState;

/// Inicializa `tracing` con el nivel de `LOG_LEVEL`
pub fn init_tracing(log_level: &str) {
    let level = log_level.parse().unwrap_or(tracing::Level::INFO);
    // Ignora el error si ya hay un subscriber global (tests)
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}
